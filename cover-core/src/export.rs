//! Snapshot export boundary.
//!
//! Rasterization lives outside this crate behind [`SnapshotRenderer`]. The
//! exporter hands it the export-filtered composition of a selection-free
//! scene, then restores the selection whether or not rendering succeeded.

use tracing::{info, warn};

use crate::compose::{compose, Composition};
use crate::error::CanvasResult;
use crate::store::SceneStore;

/// File name used for every export.
pub const EXPORT_FILE_NAME: &str = "easy-cover.png";

/// Device pixel ratio used for every export.
pub const EXPORT_PIXEL_RATIO: f32 = 1.0;

/// Options passed to a [`SnapshotRenderer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotOptions {
    /// Output pixels per scene unit.
    pub pixel_ratio: f32,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            pixel_ratio: EXPORT_PIXEL_RATIO,
        }
    }
}

/// Turns a composition into encoded PNG bytes.
pub trait SnapshotRenderer {
    /// Render `composition`. Export-excluded nodes are already removed.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Export`](crate::CanvasError::Export) if rendering fails.
    fn render(&self, composition: &Composition, options: &SnapshotOptions)
        -> CanvasResult<Vec<u8>>;
}

/// An encoded export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Suggested file name.
    pub file_name: &'static str,
    /// PNG bytes.
    pub bytes: Vec<u8>,
}

/// Export the current scene.
///
/// The selection is cleared for the duration of rendering and restored
/// afterwards, on success and on failure alike. The store is otherwise
/// untouched.
///
/// # Errors
///
/// Propagates the renderer's error.
pub fn export_snapshot(
    store: &mut SceneStore,
    renderer: &dyn SnapshotRenderer,
) -> CanvasResult<Snapshot> {
    let previous = store.take_selection();
    let composition = compose(store).exportable();
    let result = renderer.render(&composition, &SnapshotOptions::default());
    store.restore_selection(previous);

    match result {
        Ok(bytes) => {
            info!("Exported {} ({} bytes)", EXPORT_FILE_NAME, bytes.len());
            Ok(Snapshot {
                file_name: EXPORT_FILE_NAME,
                bytes,
            })
        }
        Err(e) => {
            warn!("Export failed: {e}");
            Err(e)
        }
    }
}
