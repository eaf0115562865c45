use log::{debug, info, warn};
use std::sync::Arc;

use super::encode::{abbreviate, bytes_to_png_data_url, decode_rgba, rgba_to_data_url};
use super::fallback::strip_background;
use super::model::{HttpSegmenter, NoModel, ProgressSink, RemovalOptions, SegmentationModel};
use super::source::{DefaultImageSource, ImageSource};
use super::{ImagingConfig, ImagingError};
use crate::cache::{CoalescingCache, cache_key};

/// Cache key for a removal request: the URL plus the serialized options.
#[must_use]
pub fn removal_key(url: &str, options: &RemovalOptions) -> u64 {
    let options = serde_json::to_vec(options).unwrap_or_default();
    cache_key(&[url.as_bytes(), &options])
}

/// Turns product photos into transparent PNG data URLs.
///
/// The segmentation model is tried first; whenever it (or the fetch feeding
/// it) fails the colour-distance fallback runs instead. Results are cached by
/// URL and options, and concurrent requests for the same key share one
/// computation.
pub struct BackgroundRemovalService {
    source: Arc<dyn ImageSource>,
    model: Arc<dyn SegmentationModel>,
    progress: ProgressSink,
    cache: CoalescingCache<String, ImagingError>,
}

impl BackgroundRemovalService {
    pub const DEFAULT_CAPACITY: usize = 64;

    #[must_use]
    pub fn new(source: Arc<dyn ImageSource>, model: Arc<dyn SegmentationModel>) -> Self {
        Self {
            source,
            model,
            progress: ProgressSink::none(),
            cache: CoalescingCache::new(Self::DEFAULT_CAPACITY),
        }
    }

    /// Default source, with an [`HttpSegmenter`] when an endpoint is
    /// configured and [`NoModel`] otherwise.
    #[must_use]
    pub fn from_config(config: &ImagingConfig) -> Self {
        let model: Arc<dyn SegmentationModel> = match &config.segmenter_url {
            Some(endpoint) => Arc::new(HttpSegmenter::new(endpoint.clone())),
            None => Arc::new(NoModel),
        };
        Self::new(Arc::new(DefaultImageSource::new()), model).with_capacity(config.cache_capacity)
    }

    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.cache = CoalescingCache::new(capacity);
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    /// Remove the background of the image at `url` and return it as a PNG
    /// data URL.
    ///
    /// # Errors
    ///
    /// Only when the fallback path also fails, i.e. the image cannot be
    /// fetched or decoded at all.
    pub async fn remove_background(
        &self,
        url: &str,
        options: &RemovalOptions,
    ) -> Result<String, ImagingError> {
        let key = removal_key(url, options);
        let source = Arc::clone(&self.source);
        let model = Arc::clone(&self.model);
        let progress = self.progress.clone();
        let url = url.to_string();
        let options = options.clone();
        self.cache
            .get_or_try_insert_with(key, move || {
                run_removal(source, model, progress, url, options)
            })
            .await
    }

    /// Warm the model up. Failures are logged and otherwise ignored.
    pub async fn preload_model(&self, options: &RemovalOptions) {
        match self.model.preload(options).await {
            Ok(()) => info!("segmentation model {} preloaded", options.model),
            Err(err) => warn!("model preload failed: {err}"),
        }
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

async fn run_removal(
    source: Arc<dyn ImageSource>,
    model: Arc<dyn SegmentationModel>,
    progress: ProgressSink,
    url: String,
    options: RemovalOptions,
) -> Result<String, ImagingError> {
    let label = abbreviate(&url);
    info!("removing background from {label}");
    let fetched = source.fetch(&url).await;

    let primary = match &fetched {
        Ok(bytes) => match model.remove_background(bytes, &options, &progress).await {
            Ok(cutout) => bytes_to_png_data_url(&cutout),
            Err(err) => Err(err),
        },
        Err(err) => Err(err.clone()),
    };
    let primary_err = match primary {
        Ok(data_url) => {
            debug!("model removal succeeded for {label}");
            return Ok(data_url);
        }
        Err(err) => err,
    };
    warn!("model removal failed for {label} ({primary_err}); using colour-distance fallback");

    let bytes = match fetched {
        Ok(bytes) => bytes,
        Err(_) => source.fetch(&url).await?,
    };
    fallback_cutout(&bytes, options.tolerance)
}

/// Decode, strip the estimated background colour and re-encode as PNG.
///
/// # Errors
///
/// Returns an error if the bytes are not a decodable image.
pub fn fallback_cutout(bytes: &[u8], tolerance: u8) -> Result<String, ImagingError> {
    let mut image = decode_rgba(bytes)?;
    strip_background(&mut image, tolerance);
    rgba_to_data_url(&image)
}
