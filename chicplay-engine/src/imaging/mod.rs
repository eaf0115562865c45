//! Garment image pipeline: background removal and dress compositing.

pub mod blend;
pub mod encode;
pub mod enhance;
pub mod error;
pub mod fallback;
pub mod model;
pub mod presets;
pub mod removal;
pub mod source;

use serde::{Deserialize, Serialize};

pub use blend::{BlendOptions, DressBlendResult, DressBlender};
pub use enhance::EnhanceSettings;
pub use error::ImagingError;
pub use model::{
    DEFAULT_TOLERANCE, HttpSegmenter, ModelSize, NoModel, OutputFormat, ProgressSink,
    RemovalOptions, SegmentationModel,
};
pub use presets::{
    BlendMode, BodyConfig, BodyType, Positioning, Shadows, positioning_for, shadows_for,
};
pub use removal::BackgroundRemovalService;
pub use source::{DefaultImageSource, ImageSource};

/// Tuning for the image pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImagingConfig {
    pub tolerance: u8,
    /// Transparent border added around enhanced garments, in pixels.
    pub padding: u32,
    pub noise_opacity: f32,
    pub light_opacity: f32,
    pub shade_opacity: f32,
    pub cache_capacity: usize,
    /// Base URL of an HTTP segmentation service; `None` means fallback only.
    pub segmenter_url: Option<String>,
}

impl Default for ImagingConfig {
    fn default() -> Self {
        let enhance = EnhanceSettings::default();
        Self {
            tolerance: DEFAULT_TOLERANCE,
            padding: enhance.padding,
            noise_opacity: enhance.texture_opacity,
            light_opacity: enhance.light_opacity,
            shade_opacity: enhance.shade_opacity,
            cache_capacity: BackgroundRemovalService::DEFAULT_CAPACITY,
            segmenter_url: None,
        }
    }
}

impl ImagingConfig {
    #[must_use]
    pub fn removal_options(&self) -> RemovalOptions {
        RemovalOptions {
            tolerance: self.tolerance,
            ..RemovalOptions::default()
        }
    }

    #[must_use]
    pub fn blend_options(&self) -> BlendOptions {
        BlendOptions {
            removal: self.removal_options(),
            ..BlendOptions::default()
        }
    }

    #[must_use]
    pub fn enhance_settings(&self, options: &BlendOptions) -> EnhanceSettings {
        EnhanceSettings {
            padding: self.padding,
            smooth_edges: true,
            fabric_texture: options.fabric_texture,
            texture_opacity: self.noise_opacity,
            lighting: options.lighting,
            light_opacity: self.light_opacity,
            shade_opacity: self.shade_opacity,
            noise_seed: options.noise_seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_pipeline_constants() {
        let config = ImagingConfig::default();
        assert_eq!(config.tolerance, 35);
        assert_eq!(config.padding, 40);
        assert!((config.noise_opacity - 0.03).abs() < f32::EPSILON);
        assert_eq!(config.cache_capacity, 64);
        assert!(config.segmenter_url.is_none());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: ImagingConfig =
            serde_json::from_str(r#"{"tolerance":20,"segmenterUrl":"http://localhost:7000"}"#)
                .unwrap();
        assert_eq!(config.removal_options().tolerance, 20);
        assert_eq!(config.blend_options().removal.tolerance, 20);
        assert_eq!(config.padding, 40);
        assert_eq!(config.segmenter_url.as_deref(), Some("http://localhost:7000"));
    }

    #[test]
    fn blend_toggles_reach_enhancement() {
        let config = ImagingConfig::default();
        let options = BlendOptions {
            fabric_texture: false,
            noise_seed: 5,
            ..BlendOptions::default()
        };
        let settings = config.enhance_settings(&options);
        assert!(!settings.fabric_texture);
        assert!(settings.lighting);
        assert_eq!(settings.noise_seed, 5);
    }
}
