use anyhow::{Context, Result, anyhow};
use chicplay_engine::imaging::encode::decode_data_url;
use chicplay_engine::{
    BackgroundRemovalService, BlendOptions, BodyConfig, BodyType, DressBlender, ImagingConfig,
    ModelSize, ProgressSink,
};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::util::write_file;

#[derive(Debug, Args)]
pub struct RemoveBgArgs {
    /// Image path, file:// URL, http(s) URL or data URL
    pub input: String,

    /// Where to write the transparent PNG
    #[arg(long)]
    pub output: PathBuf,

    /// Colour distance treated as background by the fallback
    #[arg(long)]
    pub tolerance: Option<u8>,

    /// Segmentation model size
    #[arg(long, default_value = "medium")]
    #[arg(value_parser = ["small", "medium", "large"])]
    pub model: String,

    /// Base URL of an HTTP segmentation service (fallback only when absent)
    #[arg(long)]
    pub segmenter_url: Option<String>,
}

#[derive(Debug, Args)]
pub struct BlendArgs {
    /// Image path, file:// URL, http(s) URL or data URL
    pub input: String,

    /// Body silhouette the garment is placed on
    #[arg(long, default_value = "average")]
    #[arg(value_parser = ["petite", "average", "tall", "curvy"])]
    pub body_type: String,

    /// Where to write the processed PNG
    #[arg(long)]
    pub output: PathBuf,

    /// Optional path for the placement metadata as JSON
    #[arg(long)]
    pub metadata: Option<PathBuf>,

    /// Skip the fabric texture overlay
    #[arg(long)]
    pub no_texture: bool,

    /// Skip the lighting gradient
    #[arg(long)]
    pub no_lighting: bool,

    /// Seed for the fabric texture noise
    #[arg(long)]
    pub noise_seed: Option<u64>,

    /// Base URL of an HTTP segmentation service (fallback only when absent)
    #[arg(long)]
    pub segmenter_url: Option<String>,
}

fn progress_sink() -> ProgressSink {
    ProgressSink::new(|stage, current, total| {
        log::info!("{stage}: {current}/{total}");
    })
}

fn with_overrides(
    mut config: ImagingConfig,
    tolerance: Option<u8>,
    segmenter_url: Option<&String>,
) -> ImagingConfig {
    if let Some(tolerance) = tolerance {
        config.tolerance = tolerance;
    }
    if let Some(url) = segmenter_url {
        config.segmenter_url = Some(url.clone());
    }
    config
}

pub async fn run_remove_bg(args: &RemoveBgArgs, config: ImagingConfig) -> Result<()> {
    let config = with_overrides(config, args.tolerance, args.segmenter_url.as_ref());
    let mut options = config.removal_options();
    options.model = args
        .model
        .parse::<ModelSize>()
        .map_err(|()| anyhow!("unknown model size {}", args.model))?;

    let service = BackgroundRemovalService::from_config(&config).with_progress(progress_sink());
    service.preload_model(&options).await;
    let data_url = service
        .remove_background(&args.input, &options)
        .await
        .with_context(|| format!("removing background from {}", args.input))?;
    let png = decode_data_url(&data_url).context("decoding processed image")?;
    write_file(&args.output, &png)?;
    println!(
        "✅ Background removed: {}",
        args.output.display().to_string().green()
    );
    Ok(())
}

pub async fn run_blend(args: &BlendArgs, config: ImagingConfig) -> Result<()> {
    let config = with_overrides(config, None, args.segmenter_url.as_ref());
    let body_type = args
        .body_type
        .parse::<BodyType>()
        .map_err(|()| anyhow!("unknown body type {}", args.body_type))?;
    let mut options = BlendOptions {
        fabric_texture: !args.no_texture,
        lighting: !args.no_lighting,
        ..config.blend_options()
    };
    if let Some(seed) = args.noise_seed {
        options.noise_seed = seed;
    }

    let removal =
        Arc::new(BackgroundRemovalService::from_config(&config).with_progress(progress_sink()));
    let blender = DressBlender::new(removal, config);
    let result = blender
        .process_dress(&args.input, &BodyConfig::new(body_type), &options)
        .await;

    if let Some(path) = &args.metadata {
        let json = serde_json::to_vec_pretty(&result).context("serializing blend metadata")?;
        write_file(path, &json)?;
    }
    if result.fallback {
        eprintln!(
            "⚠️  Blend fell back to the original image ({})",
            "see logs".yellow()
        );
        return Err(anyhow!("could not process {}", args.input));
    }

    let png = decode_data_url(&result.processed_image).context("decoding processed image")?;
    write_file(&args.output, &png)?;
    println!(
        "✅ Dress blended for {body_type} body: {}",
        args.output.display().to_string().green()
    );
    println!("   Transform: {}", result.positioning.transform);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_only_given_values() {
        let base = ImagingConfig::default();
        let url = "http://localhost:7000".to_string();
        let config = with_overrides(base.clone(), Some(12), Some(&url));
        assert_eq!(config.tolerance, 12);
        assert_eq!(config.segmenter_url.as_deref(), Some("http://localhost:7000"));
        assert_eq!(with_overrides(base.clone(), None, None), base);
    }
}
