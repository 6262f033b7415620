//! Error types for canvas operations.
//!
//! Scene store mutations never fail; these errors cover parsing and the
//! export boundary only.

use thiserror::Error;

/// Result type for canvas operations.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Errors that can occur in canvas operations.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Ratio label not present in the catalog.
    #[error("Unknown aspect ratio: {0}")]
    UnknownRatio(String),

    /// Composition or patch (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The snapshot renderer failed.
    #[error("Export failed: {0}")]
    Export(String),
}
