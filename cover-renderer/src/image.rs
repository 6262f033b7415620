//! Image source utilities.
//!
//! Element and background images are referenced by string: either a `data:`
//! URI (what generation results and uploads look like) or a local file path.
//! Remote URLs are not fetched.

use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use cover_core::Size;
use tracing::debug;

use crate::error::{RenderError, RenderResult};

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// WebP (alpha support).
    WebP,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from file extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpeg,
            "webp" => Self::WebP,
            _ => Self::Unknown,
        }
    }

    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            Self::Png
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Self::Jpeg
        } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            Self::WebP
        } else {
            Self::Unknown
        }
    }

    /// MIME type for data URIs.
    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Unknown => "application/octet-stream",
        }
    }
}

/// Read the bytes behind an image source.
///
/// # Errors
///
/// Returns an error for remote URLs, malformed data URIs and unreadable files.
pub fn load_source(source: &str) -> RenderResult<Vec<u8>> {
    if source.starts_with("data:") {
        return decode_data_uri(source);
    }
    if source.starts_with("http://") || source.starts_with("https://") {
        return Err(RenderError::Resource(format!(
            "Remote image sources are not fetched: {source}"
        )));
    }
    std::fs::read(Path::new(source))
        .map_err(|e| RenderError::Resource(format!("Failed to read {source}: {e}")))
}

/// Decode the payload of a `data:` URI.
///
/// # Errors
///
/// Returns an error if the URI is malformed.
pub fn decode_data_uri(uri: &str) -> RenderResult<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;
    let (metadata, payload) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;

    if metadata.contains(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))
    } else {
        percent_decode(payload)
    }
}

fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = input
                .get(i + 1..i + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| RenderError::Resource("Invalid URL encoding".to_string()))?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }
    Ok(result)
}

/// Encode bytes as a base64 `data:` URI, sniffing the MIME type.
#[must_use]
pub fn to_data_uri(bytes: &[u8]) -> String {
    let mime = ImageFormat::from_magic_bytes(bytes).mime();
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{encoded}")
}

/// Pixel dimensions of encoded image bytes, read from the header only.
///
/// # Errors
///
/// Returns an error if the format is unknown or the header is invalid.
pub fn dimensions_of(bytes: &[u8]) -> RenderResult<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| RenderError::Resource(format!("Failed to guess image format: {e}")))?
        .into_dimensions()
        .map_err(|e| RenderError::Resource(format!("Failed to read image header: {e}")))
}

/// Natural size of the image behind `source`.
///
/// Used to feed cover fits, which need the background's aspect ratio.
///
/// # Errors
///
/// Returns an error if the source cannot be loaded or decoded.
#[allow(clippy::cast_precision_loss)]
pub fn probe_dimensions(source: &str) -> RenderResult<Size> {
    let bytes = load_source(source)?;
    let (width, height) = dimensions_of(&bytes)?;
    debug!("Probed image {width}x{height}");
    Ok(Size::new(width as f32, height as f32))
}

/// A source inlined as a data URI together with its size, if decodable.
#[derive(Debug, Clone)]
pub struct InlineImage {
    /// `data:` URI safe to embed in SVG.
    pub href: String,
    /// Natural size in pixels.
    pub size: Option<Size>,
}

/// Inline `source` for embedding.
///
/// # Errors
///
/// Returns an error if the source cannot be loaded.
#[allow(clippy::cast_precision_loss)]
pub fn inline_source(source: &str) -> RenderResult<InlineImage> {
    let bytes = load_source(source)?;
    let size = dimensions_of(&bytes)
        .ok()
        .map(|(w, h)| Size::new(w as f32, h as f32));
    let href = if source.starts_with("data:") {
        source.to_string()
    } else {
        to_data_uri(&bytes)
    };
    Ok(InlineImage { href, size })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1x1 red pixel.
    const PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    #[test]
    fn test_format_detection_from_extension() {
        assert_eq!(ImageFormat::from_extension("PNG"), ImageFormat::Png);
        assert_eq!(ImageFormat::from_extension("jpeg"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_extension("gif"), ImageFormat::Unknown);
    }

    #[test]
    fn test_format_detection_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
            ImageFormat::Png
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(b"RIFF\x00\x00\x00\x00WEBP"),
            ImageFormat::WebP
        );
        assert_eq!(ImageFormat::from_magic_bytes(&[1, 2]), ImageFormat::Unknown);
    }

    #[test]
    fn test_probe_data_uri() {
        let size = probe_dimensions(&format!("data:image/png;base64,{PNG_BASE64}")).expect("probe");
        assert_eq!(size, Size::new(1.0, 1.0));
    }

    #[test]
    fn test_probe_file() {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(PNG_BASE64)
            .expect("decode");
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pixel.png");
        std::fs::write(&path, &bytes).expect("write");

        let inline = inline_source(path.to_str().expect("utf8 path")).expect("inline");
        assert!(inline.href.starts_with("data:image/png;base64,"));
        assert_eq!(inline.size, Some(Size::new(1.0, 1.0)));
    }

    #[test]
    fn test_percent_encoded_data_uri() {
        let bytes = decode_data_uri("data:text/plain,a%20b").expect("decode");
        assert_eq!(bytes, b"a b");
        assert!(decode_data_uri("data:text/plain,%zz").is_err());
    }

    #[test]
    fn test_invalid_sources() {
        assert!(load_source("data:image/png").is_err());
        assert!(load_source("https://example.com/a.png").is_err());
        assert!(load_source("/definitely/not/here.png").is_err());
    }
}
