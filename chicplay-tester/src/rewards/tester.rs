use chicplay_engine::RewardConfig;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::scenarios::{RewardScenario, Session};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    pub final_points: u64,
    pub final_level: u32,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
}

pub struct RewardTester {
    config: RewardConfig,
    verbose: bool,
}

impl RewardTester {
    pub const fn new(config: RewardConfig, verbose: bool) -> Self {
        Self { config, verbose }
    }

    pub fn run_scenario(
        &self,
        scenario: &RewardScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        seeds
            .iter()
            .map(|&seed| {
                if self.verbose {
                    println!(
                        "🧪 Testing scenario: {} (seed: {seed})",
                        scenario.key.bright_white()
                    );
                }
                self.run_single_scenario(scenario, seed, iterations)
            })
            .collect()
    }

    fn run_single_scenario(
        &self,
        scenario: &RewardScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut timings = Vec::new();
        let mut final_points = 0;
        let mut final_level = 1;

        for i in 0..iterations {
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let mut session = Session::new(iteration_seed, self.config.clone());
            let start = Instant::now();
            let outcome = (scenario.run)(&mut session);
            let elapsed = start.elapsed();
            final_points = session.state().points;
            final_level = session.state().level;

            match outcome {
                Ok(()) => {
                    successes += 1;
                    timings.push(elapsed);
                    if self.verbose {
                        println!(
                            "  ✅ Iteration {}/{iterations} passed ({elapsed:?}) steps:{} points:{} level:{}",
                            i + 1,
                            session.steps(),
                            final_points,
                            final_level
                        );
                    }
                }
                Err(err) => {
                    let message = format!(
                        "Iteration {} (seed {iteration_seed}, steps {}): {err}",
                        i + 1,
                        session.steps()
                    );
                    log::debug!("{message}");
                    if self.verbose {
                        println!("  ❌ {}", message.clone().red());
                    }
                    failures.push(message);
                }
            }
        }

        let average_duration = if timings.is_empty() {
            Duration::ZERO
        } else {
            timings.iter().sum::<Duration>() / u32::try_from(timings.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.key.to_string(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            final_points,
            final_level,
            average_duration,
        }
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_micros().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = u128::deserialize(deserializer)?;
        Ok(Duration::from_micros(u64::try_from(micros).unwrap_or(u64::MAX)))
    }
}
