//! `cover generate`: one provider request, files on disk.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use cover_ai::{AiConfig, GenerationRequest, GenerationSession};
use cover_renderer::image::{decode_data_uri, to_data_uri};
use cover_renderer::ImageFormat;
use tracing::info;

use crate::GenerateArgs;

/// File name prefix for generated images.
pub const GENERATED_PREFIX: &str = "generated-";

/// File extension matching the encoded image bytes; PNG when unrecognised.
fn extension_for(bytes: &[u8]) -> &'static str {
    match ImageFormat::from_magic_bytes(bytes) {
        ImageFormat::Jpeg => "jpg",
        ImageFormat::WebP => "webp",
        ImageFormat::Png | ImageFormat::Unknown => "png",
    }
}

/// Read an image file as a `data:` URI.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read_source(path: &Path) -> anyhow::Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(to_data_uri(&bytes))
}

/// Run one generation with the active provider and write each image to
/// `<out_dir>/generated-<n>.<ext>`, numbered from 1. The extension follows
/// the format of the returned bytes.
///
/// Must be called inside a tokio runtime.
///
/// # Errors
///
/// Returns the user-facing message when validation or the provider fails,
/// or an error if files cannot be written.
pub async fn generate_images(
    config: &AiConfig,
    args: &GenerateArgs,
) -> anyhow::Result<Vec<PathBuf>> {
    let mut options = config.options.clone();
    if let Some(ratio) = &args.aspect_ratio {
        options.aspect_ratio.clone_from(ratio);
    }
    let source_image = args.source.as_deref().map(read_source).transpose()?;
    let request = GenerationRequest {
        mode: args.mode.into(),
        prompt: args.prompt.clone(),
        source_image,
        options,
    };

    let mut session = GenerationSession::new(config.client()?);
    if session.submit(request).is_some() {
        session.next_completion().await;
    }
    if let Some(message) = session.error() {
        bail!("{message}");
    }

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;
    // Session order is newest first; number files in provider order.
    let mut paths = Vec::new();
    for (n, image) in session.images().iter().rev().enumerate() {
        let bytes = decode_data_uri(image)?;
        let ext = extension_for(&bytes);
        let path = args.out_dir.join(format!("{GENERATED_PREFIX}{}.{ext}", n + 1));
        std::fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "Generated image written");
        paths.push(path);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_follows_magic_bytes() {
        assert_eq!(extension_for(&[0x89, 0x50, 0x4E, 0x47, 0x0D]), "png");
        assert_eq!(extension_for(&[0xFF, 0xD8, 0xFF, 0xE0]), "jpg");
        assert_eq!(extension_for(b"RIFF\0\0\0\0WEBPVP8 "), "webp");
        assert_eq!(extension_for(b"GIF89a"), "png");
        assert_eq!(extension_for(&[]), "png");
    }
}
