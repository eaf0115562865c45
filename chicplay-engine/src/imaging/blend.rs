//! Composites a garment photo for the virtual try-on: background removal,
//! enhancement and the placement metadata the renderer needs.
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::encode::{abbreviate, decode_data_url, decode_rgba, rgba_to_data_url};
use super::enhance::{DEFAULT_NOISE_SEED, enhance};
use super::model::RemovalOptions;
use super::presets::{
    BlendMode, BodyConfig, Positioning, Shadows, positioning_for, shadows_for,
};
use super::removal::BackgroundRemovalService;
use super::{ImagingConfig, ImagingError};
use crate::cache::{CoalescingCache, cache_key};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlendOptions {
    pub removal: RemovalOptions,
    /// Run padding, edge smoothing and the colour effects below.
    pub enhance: bool,
    pub fabric_texture: bool,
    pub lighting: bool,
    pub noise_seed: u64,
}

impl Default for BlendOptions {
    fn default() -> Self {
        Self {
            removal: RemovalOptions::default(),
            enhance: true,
            fabric_texture: true,
            lighting: true,
            noise_seed: DEFAULT_NOISE_SEED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DressBlendResult {
    /// PNG data URL of the processed garment, or the original URL on fallback.
    pub processed_image: String,
    pub positioning: Positioning,
    pub shadows: Shadows,
    pub blend_mode: BlendMode,
    pub original_url: String,
    pub fallback: bool,
}

impl DressBlendResult {
    /// Unprocessed result: the original image laid over the body in
    /// multiply mode so its studio-white background disappears.
    #[must_use]
    pub fn fallback(url: &str, body: &BodyConfig) -> Self {
        Self {
            processed_image: url.to_string(),
            positioning: positioning_for(body.body_type),
            shadows: shadows_for(body.body_type),
            blend_mode: BlendMode::Multiply,
            original_url: url.to_string(),
            fallback: true,
        }
    }
}

pub struct DressBlender {
    removal: Arc<BackgroundRemovalService>,
    config: ImagingConfig,
    cache: CoalescingCache<DressBlendResult, ImagingError>,
}

impl DressBlender {
    #[must_use]
    pub fn new(removal: Arc<BackgroundRemovalService>, config: ImagingConfig) -> Self {
        let cache = CoalescingCache::new(config.cache_capacity);
        Self {
            removal,
            config,
            cache,
        }
    }

    #[must_use]
    pub fn from_config(config: ImagingConfig) -> Self {
        let removal = Arc::new(BackgroundRemovalService::from_config(&config));
        Self::new(removal, config)
    }

    #[must_use]
    pub fn removal(&self) -> &BackgroundRemovalService {
        &self.removal
    }

    /// Prepare a dress image for the given body. Never fails: on any error
    /// the result carries the original URL and `fallback: true`, and is not
    /// cached.
    pub async fn process_dress(
        &self,
        url: &str,
        body: &BodyConfig,
        options: &BlendOptions,
    ) -> DressBlendResult {
        let key = blend_key(url, body, options);
        let removal = Arc::clone(&self.removal);
        let config = self.config.clone();
        let owned_url = url.to_string();
        let body_owned = *body;
        let owned_options = options.clone();
        let result = self
            .cache
            .get_or_try_insert_with(key, move || {
                compose(removal, config, owned_url, body_owned, owned_options)
            })
            .await;
        match result {
            Ok(result) => result,
            Err(err) => {
                warn!("dress blend failed for {}: {err}", abbreviate(url));
                DressBlendResult::fallback(url, body)
            }
        }
    }

    /// Drop cached blends and the removal results behind them.
    pub fn clear_cache(&self) {
        self.cache.clear();
        self.removal.clear_cache();
    }

    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

fn blend_key(url: &str, body: &BodyConfig, options: &BlendOptions) -> u64 {
    let body = serde_json::to_vec(body).unwrap_or_default();
    let options = serde_json::to_vec(options).unwrap_or_default();
    cache_key(&[url.as_bytes(), &body, &options])
}

async fn compose(
    removal: Arc<BackgroundRemovalService>,
    config: ImagingConfig,
    url: String,
    body: BodyConfig,
    options: BlendOptions,
) -> Result<DressBlendResult, ImagingError> {
    let cutout = removal.remove_background(&url, &options.removal).await?;
    let processed_image = if options.enhance {
        let image = decode_rgba(&decode_data_url(&cutout)?)?;
        let enhanced = enhance(&image, &config.enhance_settings(&options));
        rgba_to_data_url(&enhanced)?
    } else {
        cutout
    };
    info!(
        "dress composed for {} ({} body)",
        abbreviate(&url),
        body.body_type
    );
    Ok(DressBlendResult {
        processed_image,
        positioning: positioning_for(body.body_type),
        shadows: shadows_for(body.body_type),
        blend_mode: BlendMode::Normal,
        original_url: url,
        fallback: false,
    })
}
