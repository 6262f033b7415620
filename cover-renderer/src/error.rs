//! Renderer error types.

use cover_core::CanvasError;
use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// An image source could not be read or decoded.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// SVG parsing, rasterization or encoding failed.
    #[error("Export failed: {0}")]
    Export(String),
}

impl From<RenderError> for CanvasError {
    fn from(err: RenderError) -> Self {
        CanvasError::Export(err.to_string())
    }
}
