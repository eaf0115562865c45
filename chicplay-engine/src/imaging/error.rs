/// Failures inside the image pipeline.
///
/// Payloads are strings so the error is `Clone` and can be handed to every
/// caller waiting on a shared computation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImagingError {
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("Unexpected HTTP status {status} from {url}")]
    HttpStatus { url: String, status: u16 },
    #[error("Unsupported image url: {0}")]
    UnsupportedUrl(String),
    #[error("Image decode error: {0}")]
    Decode(String),
    #[error("Image encode error: {0}")]
    Encode(String),
    #[error("Segmentation model error: {0}")]
    Model(String),
    #[error("Segmentation model unavailable")]
    ModelUnavailable,
}

impl From<image::ImageError> for ImagingError {
    fn from(err: image::ImageError) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<base64::DecodeError> for ImagingError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Decode(err.to_string())
    }
}
