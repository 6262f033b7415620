//! Generation requests and the options shared by every provider.

use serde::{Deserialize, Serialize};

/// Default aspect ratio sent to providers.
pub const DEFAULT_ASPECT_RATIO: &str = "1:1";

/// Default output size tier.
pub const DEFAULT_IMAGE_SIZE: &str = "1K";

/// Whether a request creates a new image or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// Text-to-image.
    #[default]
    Create,
    /// Image-to-image; requires a source image.
    Edit,
}

/// Provider-facing options persisted with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationOptions {
    /// Aspect ratio label such as `16:9`.
    pub aspect_ratio: String,
    /// Size tier such as `1K`, `2K` or `4K`.
    pub image_size: String,
    /// Let the provider ground the prompt with web search (create only).
    #[serde(rename = "webSearchEnabled")]
    pub web_search: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            aspect_ratio: DEFAULT_ASPECT_RATIO.to_string(),
            image_size: DEFAULT_IMAGE_SIZE.to_string(),
            web_search: false,
        }
    }
}

/// A single generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Create or edit.
    pub mode: GenerationMode,
    /// User prompt.
    pub prompt: String,
    /// Source image as a data URL, required for [`GenerationMode::Edit`].
    pub source_image: Option<String>,
    /// Provider options.
    pub options: GenerationOptions,
}

impl GenerationRequest {
    /// Text-to-image request with default options.
    #[must_use]
    pub fn create(prompt: impl Into<String>) -> Self {
        Self {
            mode: GenerationMode::Create,
            prompt: prompt.into(),
            source_image: None,
            options: GenerationOptions::default(),
        }
    }

    /// Image-to-image request with default options.
    #[must_use]
    pub fn edit(prompt: impl Into<String>, source_image: impl Into<String>) -> Self {
        Self {
            mode: GenerationMode::Edit,
            prompt: prompt.into(),
            source_image: Some(source_image.into()),
            options: GenerationOptions::default(),
        }
    }

    /// Replace the options.
    #[must_use]
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }
}

/// Split a `data:<mime>;base64,<payload>` URL into mime type and payload.
///
/// Anything that does not match is treated as a bare base64 PNG payload.
#[must_use]
pub fn split_data_url(url: &str) -> (&str, &str) {
    url.strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .filter(|(mime, data)| !mime.is_empty() && !data.is_empty())
        .unwrap_or(("image/png", url))
}

/// Build a data URL from a mime type and base64 payload.
#[must_use]
pub fn to_data_url(mime: &str, data: &str) -> String {
    format!("data:{mime};base64,{data}")
}
