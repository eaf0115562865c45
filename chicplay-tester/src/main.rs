mod imaging;
mod rewards;
mod util;

use anyhow::{Context, Result};
use chicplay_engine::ChicplayConfig;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use imaging::{BlendArgs, RemoveBgArgs};
use rewards::{RewardTester, ScenarioResult, all_keys, get_scenario, list_scenarios};
use util::{OutputTarget, parse_seeds, split_csv};

#[derive(Debug, Parser)]
#[command(name = "chicplay-tester", version = "0.1.0")]
#[command(about = "Scenario runner and image pipeline tools for the ChicPlay engine")]
struct Cli {
    /// JSON configuration file (rewards and imaging sections)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run scripted reward scenarios and check engine invariants
    Rewards(RewardsArgs),
    /// Remove the background of a garment photo
    RemoveBg(RemoveBgArgs),
    /// Prepare a dress image for a body type
    Blend(BlendArgs),
}

#[derive(Debug, Args)]
struct RewardsArgs {
    /// Scenarios to run (comma-separated, or "all")
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ChicplayConfig::load(path)?,
        None => ChicplayConfig::default(),
    };

    match &cli.command {
        Command::Rewards(args) => {
            let all_passed = run_rewards(args, &config)?;
            if !all_passed {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::RemoveBg(args) => imaging::run_remove_bg(args, config.imaging).await,
        Command::Blend(args) => imaging::run_blend(args, config.imaging).await,
    }
}

fn announce_banner() {
    println!("{}", "👗 ChicPlay Reward Tester".bright_cyan().bold());
    println!("{}", "=========================".cyan());
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s == "all") {
        scenarios.retain(|s| s != "all");
        for key in all_keys() {
            if !scenarios.contains(&key) {
                scenarios.push(key);
            }
        }
    }
    scenarios
}

fn maybe_list_scenarios(args: &RewardsArgs) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:12} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

/// Returns whether every scenario passed.
fn run_rewards(args: &RewardsArgs, config: &ChicplayConfig) -> Result<bool> {
    if maybe_list_scenarios(args)? {
        return Ok(true);
    }
    announce_banner();

    let start_time = Instant::now();
    let seeds = parse_seeds(&args.seeds).context("parsing --seeds")?;
    let tester = RewardTester::new(config.rewards.clone(), args.verbose);

    let mut results: Vec<ScenarioResult> = Vec::new();
    for name in expand_scenarios(&args.scenarios) {
        if let Some(scenario) = get_scenario(&name) {
            results.extend(tester.run_scenario(scenario, &seeds, args.iterations));
        } else {
            eprintln!("⚠️  Unknown scenario: {}", name.yellow());
        }
    }

    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report.as_str() {
        "json" => rewards::reports::generate_json_report(&mut output_target, &results)?,
        "markdown" => rewards::reports::generate_markdown_report(&mut output_target, &results)?,
        _ => {
            rewards::reports::generate_console_report(
                &mut output_target,
                &results,
                start_time.elapsed(),
            )?;
            writeln!(&mut output_target, "🏁 Total time: {:?}", start_time.elapsed())?;
        }
    }
    output_target.flush_inner()?;

    Ok(results.iter().all(|r| r.passed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> RewardsArgs {
        RewardsArgs {
            scenarios: "smoke".to_string(),
            list_scenarios: false,
            seeds: "1337".to_string(),
            iterations: 1,
            report: "json".to_string(),
            verbose: false,
            output: None,
        }
    }

    #[test]
    fn all_expands_to_every_scenario_once() {
        let expanded = expand_scenarios("quiz,all");
        assert_eq!(expanded[0], "quiz");
        assert_eq!(expanded.len(), all_keys().len());
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::parse_from([
            "chicplay-tester",
            "blend",
            "dress.png",
            "--body-type",
            "curvy",
            "--output",
            "out.png",
            "--no-texture",
        ]);
        let Command::Blend(args) = cli.command else {
            panic!("expected blend");
        };
        assert_eq!(args.body_type, "curvy");
        assert!(args.no_texture);
        assert!(!args.no_lighting);
    }

    #[test]
    fn run_rewards_writes_report_to_file() {
        let path = std::env::temp_dir().join(format!(
            "chicplay-main-{}.json",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        let args = RewardsArgs {
            scenarios: "all".to_string(),
            output: Some(path.clone()),
            ..base_args()
        };
        assert!(run_rewards(&args, &ChicplayConfig::default()).unwrap());
        let parsed: Vec<ScenarioResult> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.len(), all_keys().len());
        std::fs::remove_file(path).ok();
    }
}
