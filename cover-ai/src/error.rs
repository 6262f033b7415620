//! Error types for image generation and provider configuration.

use thiserror::Error;

/// Result type for generation calls.
pub type GenerationResult<T> = Result<T, GenerationError>;

/// Errors returned by an [`ImageGenerator`](crate::ImageGenerator).
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The provider rejected the request; the message is shown to the user.
    #[error("{0}")]
    Provider(String),
    /// The response did not contain the expected image payloads.
    #[error("Invalid response format: {0}")]
    Format(String),
    /// The configured endpoint is not a valid URL.
    #[error("Invalid provider endpoint: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed (connection, timeout, etc.).
    #[error("Image generation request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The response body was not JSON.
    #[error("Failed to parse provider response: {0}")]
    Json(#[from] serde_json::Error),
}

impl GenerationError {
    /// Returns true if retrying the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

/// Result type for configuration storage.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or saving provider configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the backing store failed.
    #[error("Config I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The stored document is not valid JSON or has the wrong shape.
    #[error("Config is malformed: {0}")]
    Json(#[from] serde_json::Error),
    /// The stored document was written by a newer version.
    #[error("Unsupported config version {found} (newest known is {supported})")]
    UnsupportedVersion {
        /// Version found in the document.
        found: u64,
        /// Newest version this build can read.
        supported: u64,
    },
    /// A store key contains characters that cannot be used as a file name.
    #[error("Invalid config key: {0}")]
    InvalidKey(String),
}
