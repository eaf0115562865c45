//! Where image bytes come from.
use async_trait::async_trait;
use std::path::PathBuf;

use super::ImagingError;
use super::encode::{abbreviate, decode_data_url};

/// Fetches raw image bytes for a URL.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the image cannot be retrieved.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ImagingError>;
}

/// Understands `data:` URLs, `http(s)://` URLs and local paths
/// (with or without a `file://` prefix).
#[derive(Debug, Clone, Default)]
pub struct DefaultImageSource {
    client: reqwest::Client,
}

impl DefaultImageSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn fetch_http(&self, url: &str) -> Result<Vec<u8>, ImagingError> {
        let fetch_error = |err: reqwest::Error| ImagingError::Fetch {
            url: url.to_string(),
            reason: err.to_string(),
        };
        let response = self.client.get(url).send().await.map_err(fetch_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ImagingError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await.map_err(fetch_error)?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ImageSource for DefaultImageSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ImagingError> {
        if url.starts_with("data:") {
            return decode_data_url(url);
        }
        if url.starts_with("http://") || url.starts_with("https://") {
            return self.fetch_http(url).await;
        }
        if url.contains("://") && !url.starts_with("file://") {
            return Err(ImagingError::UnsupportedUrl(abbreviate(url)));
        }
        let path = PathBuf::from(url.strip_prefix("file://").unwrap_or(url));
        tokio::fs::read(&path)
            .await
            .map_err(|err| ImagingError::Fetch {
                url: path.display().to_string(),
                reason: err.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn data_urls_are_decoded_inline() {
        let source = DefaultImageSource::new();
        let bytes = source.fetch("data:text/plain,abc").await.unwrap();
        assert_eq!(bytes, b"abc");
    }

    #[tokio::test]
    async fn missing_files_and_unknown_schemes_fail() {
        let source = DefaultImageSource::new();
        assert!(matches!(
            source.fetch("/definitely/not/here.png").await,
            Err(ImagingError::Fetch { .. })
        ));
        assert!(matches!(
            source.fetch("ftp://example.com/dress.png").await,
            Err(ImagingError::UnsupportedUrl(_))
        ));
    }
}
