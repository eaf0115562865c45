//! PNG / data URL conversions.
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;

use super::ImagingError;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];

/// Decode any supported image format into an RGBA buffer.
///
/// # Errors
///
/// Returns [`ImagingError::Decode`] if the bytes are not a readable image.
pub fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage, ImagingError> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// Encode an RGBA buffer as PNG bytes (alpha preserved).
///
/// # Errors
///
/// Returns [`ImagingError::Encode`] if the encoder fails.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ImagingError> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|err| ImagingError::Encode(err.to_string()))?;
    Ok(out.into_inner())
}

#[must_use]
pub fn is_png(bytes: &[u8]) -> bool {
    bytes.starts_with(&PNG_SIGNATURE)
}

/// Wrap PNG bytes in a `data:` URL.
#[must_use]
pub fn png_data_url(png: &[u8]) -> String {
    format!("{PNG_DATA_URL_PREFIX}{}", STANDARD.encode(png))
}

/// Encode an RGBA buffer straight to a PNG data URL.
///
/// # Errors
///
/// Returns [`ImagingError::Encode`] if the encoder fails.
pub fn rgba_to_data_url(image: &RgbaImage) -> Result<String, ImagingError> {
    encode_png(image).map(|png| png_data_url(&png))
}

/// Make sure arbitrary image bytes end up as a PNG data URL, re-encoding
/// when the model handed back some other format.
///
/// # Errors
///
/// Returns an error if non-PNG bytes cannot be decoded or re-encoded.
pub fn bytes_to_png_data_url(bytes: &[u8]) -> Result<String, ImagingError> {
    if is_png(bytes) {
        return Ok(png_data_url(bytes));
    }
    rgba_to_data_url(&decode_rgba(bytes)?)
}

/// Extract the payload of a `data:` URL.
///
/// # Errors
///
/// Returns an error if the URL is not a data URL or its payload is malformed.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, ImagingError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| ImagingError::UnsupportedUrl(abbreviate(url)))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| ImagingError::Decode("data url has no payload".to_string()))?;
    if meta.ends_with(";base64") {
        Ok(STANDARD.decode(payload.trim())?)
    } else {
        Ok(payload.as_bytes().to_vec())
    }
}

/// Shorten long URLs (data URLs in particular) for messages and logs.
#[must_use]
pub fn abbreviate(url: &str) -> String {
    const MAX: usize = 64;
    if url.len() <= MAX {
        return url.to_string();
    }
    let cut = (0..=MAX).rev().find(|&i| url.is_char_boundary(i)).unwrap_or(0);
    format!("{}…", &url[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn png_data_url_roundtrips_pixels() {
        let mut img = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]));
        img.put_pixel(1, 1, Rgba([0, 0, 0, 0]));
        let url = rgba_to_data_url(&img).unwrap();
        assert!(url.starts_with(PNG_DATA_URL_PREFIX));
        let bytes = decode_data_url(&url).unwrap();
        assert!(is_png(&bytes));
        let back = decode_rgba(&bytes).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn non_data_urls_are_rejected() {
        assert!(matches!(
            decode_data_url("https://cdn.example/dress.png"),
            Err(ImagingError::UnsupportedUrl(_))
        ));
        assert!(decode_data_url("data:image/png;base64").is_err());
    }

    #[test]
    fn abbreviate_keeps_short_urls() {
        assert_eq!(abbreviate("a.png"), "a.png");
        let long = "x".repeat(200);
        assert!(abbreviate(&long).chars().count() <= 65);
    }
}
