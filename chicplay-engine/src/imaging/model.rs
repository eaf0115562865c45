//! Machine-learning segmentation seam.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::ImagingError;

pub const DEFAULT_TOLERANCE: u8 = 35;

/// Segmentation model variant; larger is slower and more precise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl ModelSize {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelSize {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            _ => Err(()),
        }
    }
}

/// Encoding of the cut-out. Only PNG keeps the alpha channel the
/// compositor relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
}

/// Options for one background-removal request. Part of the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemovalOptions {
    pub model: ModelSize,
    pub output: OutputFormat,
    /// Colour distance below which the fallback treats a pixel as background.
    pub tolerance: u8,
}

impl Default for RemovalOptions {
    fn default() -> Self {
        Self {
            model: ModelSize::default(),
            output: OutputFormat::default(),
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Progress callback: stage label, completed units, total units.
pub type ProgressFn = dyn Fn(&str, u64, u64) + Send + Sync;

/// Optional progress reporter handed to the model.
#[derive(Clone, Default)]
pub struct ProgressSink(Option<Arc<ProgressFn>>);

impl ProgressSink {
    #[must_use]
    pub fn new(callback: impl Fn(&str, u64, u64) + Send + Sync + 'static) -> Self {
        Self(Some(Arc::new(callback)))
    }

    #[must_use]
    pub const fn none() -> Self {
        Self(None)
    }

    pub fn report(&self, stage: &str, current: u64, total: u64) {
        if let Some(callback) = &self.0 {
            callback(stage, current, total);
        }
    }
}

impl fmt::Debug for ProgressSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ProgressSink")
            .field(&self.0.as_ref().map(|_| "callback"))
            .finish()
    }
}

/// External background-removal model.
#[async_trait]
pub trait SegmentationModel: Send + Sync {
    /// Return the image with its background removed (PNG preferred).
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot process the image.
    async fn remove_background(
        &self,
        image: &[u8],
        options: &RemovalOptions,
        progress: &ProgressSink,
    ) -> Result<Vec<u8>, ImagingError>;

    /// Warm the model up ahead of the first request.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be loaded.
    async fn preload(&self, options: &RemovalOptions) -> Result<(), ImagingError>;
}

/// Model stand-in that is never available, so every request takes the
/// algorithmic fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoModel;

#[async_trait]
impl SegmentationModel for NoModel {
    async fn remove_background(
        &self,
        _image: &[u8],
        _options: &RemovalOptions,
        _progress: &ProgressSink,
    ) -> Result<Vec<u8>, ImagingError> {
        Err(ImagingError::ModelUnavailable)
    }

    async fn preload(&self, _options: &RemovalOptions) -> Result<(), ImagingError> {
        Err(ImagingError::ModelUnavailable)
    }
}

/// Segmentation served over HTTP: the image is POSTed as the request body to
/// `{endpoint}/remove?model=<size>` and the response body is the cut-out PNG.
/// `GET {endpoint}/warmup?model=<size>` preloads the model.
#[derive(Debug, Clone)]
pub struct HttpSegmenter {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSegmenter {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str, options: &RemovalOptions) -> String {
        format!("{}/{path}?model={}", self.endpoint, options.model)
    }

    fn model_error(err: &reqwest::Error) -> ImagingError {
        ImagingError::Model(err.to_string())
    }
}

#[async_trait]
impl SegmentationModel for HttpSegmenter {
    async fn remove_background(
        &self,
        image: &[u8],
        options: &RemovalOptions,
        progress: &ProgressSink,
    ) -> Result<Vec<u8>, ImagingError> {
        let url = self.url("remove", options);
        let total = u64::try_from(image.len()).unwrap_or(u64::MAX);
        progress.report("upload", 0, total);
        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await
            .map_err(|err| Self::model_error(&err))?;
        progress.report("upload", total, total);

        let status = response.status();
        if !status.is_success() {
            return Err(ImagingError::HttpStatus {
                url,
                status: status.as_u16(),
            });
        }
        progress.report("inference", 0, 1);
        let bytes = response
            .bytes()
            .await
            .map_err(|err| Self::model_error(&err))?;
        progress.report("inference", 1, 1);
        if bytes.is_empty() {
            return Err(ImagingError::Model("empty response body".to_string()));
        }
        Ok(bytes.to_vec())
    }

    async fn preload(&self, options: &RemovalOptions) -> Result<(), ImagingError> {
        let url = self.url("warmup", options);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| Self::model_error(&err))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ImagingError::HttpStatus {
                url,
                status: response.status().as_u16(),
            })
        }
    }
}
