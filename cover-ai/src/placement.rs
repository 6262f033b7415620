//! Moving generated images onto the canvas.

use cover_core::{BackgroundPatch, ElementId, SceneStore};
use tracing::debug;

/// Use a generated image as the canvas background.
pub fn apply_to_background(store: &mut SceneStore, image: &str) {
    debug!("Applying generated image to background");
    store.update_background(BackgroundPatch::image(image));
}

/// Add a generated image as a movable layer at the canvas center.
///
/// The new layer is selected.
pub fn place_on_canvas(store: &mut SceneStore, image: &str) -> ElementId {
    let id = store.add_ai_image(image);
    debug!(%id, "Placed generated image on canvas");
    id
}
