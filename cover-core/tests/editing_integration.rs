//! Editing Integration Tests
//!
//! Drives the store through the interaction controller the way a host would:
//! - Ratio selection and canvas bounds
//! - Press / move / release drags under a view scale
//! - Split text, duplicate and removal flows
//! - Export after editing

use cover_core::geometry::{view_scale, DEFAULT_VIEW_PADDING, DEFAULT_VIEW_SHRINK};
use cover_core::split::{Axis, Run};
use cover_core::{
    compose, export_snapshot, AspectRatio, CanvasResult, Composition, Disposition, ElementRef,
    InteractionController, NodeKind, Placed, Point, PointerEvent, SceneStore, Size,
    SnapshotOptions, SnapshotRenderer, SplitOffsets, TextPatch,
};

/// Renderer that encodes the number of exported nodes instead of pixels.
struct CountingRenderer;

impl SnapshotRenderer for CountingRenderer {
    fn render(&self, composition: &Composition, _options: &SnapshotOptions) -> CanvasResult<Vec<u8>> {
        Ok(composition.node_count().to_le_bytes().to_vec())
    }
}

fn drag(
    controller: &mut InteractionController,
    store: &mut SceneStore,
    target: ElementRef,
    from: (f32, f32),
    to: (f32, f32),
    scale: f32,
) {
    let down = PointerEvent::press_on(target, from.0, from.1);
    assert_eq!(controller.handle(store, &down, scale), Disposition::Consumed);
    controller.handle(store, &PointerEvent::moved(to.0, to.1), scale);
    controller.handle(store, &PointerEvent::released(to.0, to.1), scale);
}

// ============================================================================
// Geometry Through the Store
// ============================================================================

#[test]
fn test_default_scene_is_widescreen() {
    let store = SceneStore::new();
    assert_eq!(store.canvas_size(), Size::new(1600.0, 900.0));
}

#[test]
fn test_view_scale_follows_active_ratios() {
    let mut store = SceneStore::new();
    let container = Size::new(1280.0, 800.0);
    let before = view_scale(
        store.canvas_size(),
        container,
        DEFAULT_VIEW_PADDING,
        DEFAULT_VIEW_SHRINK,
    );

    store.toggle_ratio(AspectRatio::Portrait);
    let after = view_scale(
        store.canvas_size(),
        container,
        DEFAULT_VIEW_PADDING,
        DEFAULT_VIEW_SHRINK,
    );

    // Taller canvas in the same container shrinks the view.
    assert!(after < before);
}

// ============================================================================
// Drag Workflow Tests
// ============================================================================

#[test]
fn test_drag_at_half_scale() {
    let mut store = SceneStore::new();
    let mut controller = InteractionController::new();
    let target = store.texts()[0].element_ref();

    drag(&mut controller, &mut store, target, (100.0, 100.0), (150.0, 130.0), 0.5);

    let text = &store.texts()[0];
    assert!((text.x - 100.0).abs() < 1e-4);
    assert!((text.y - 60.0).abs() < 1e-4);
    assert_eq!(store.selection(), Some(target));
    assert!(!controller.is_dragging());
}

#[test]
fn test_consecutive_drags_accumulate() {
    let mut store = SceneStore::new();
    let mut controller = InteractionController::new();
    let target = store.icons()[0].element_ref();

    drag(&mut controller, &mut store, target, (0.0, 0.0), (20.0, 0.0), 2.0);
    drag(&mut controller, &mut store, target, (50.0, 50.0), (50.0, 80.0), 2.0);

    let icon = &store.icons()[0];
    assert!((icon.x - 10.0).abs() < 1e-4);
    assert!((icon.y - 15.0).abs() < 1e-4);
}

#[test]
fn test_release_far_from_element_commits_last_move() {
    let mut store = SceneStore::new();
    let mut controller = InteractionController::new();
    let target = store.texts()[0].element_ref();

    controller.handle(&mut store, &PointerEvent::press_on(target, 0.0, 0.0), 1.0);
    controller.handle(&mut store, &PointerEvent::moved(40.0, 40.0), 1.0);
    controller.handle(&mut store, &PointerEvent::released(900.0, 900.0), 1.0);

    assert_eq!(store.texts()[0].position(), Point::new(40.0, 40.0));
}

#[test]
fn test_background_click_deselects() {
    let mut store = SceneStore::new();
    let mut controller = InteractionController::new();
    let target = store.texts()[0].element_ref();

    drag(&mut controller, &mut store, target, (0.0, 0.0), (0.0, 0.0), 1.0);
    assert!(store.selection().is_some());

    let press = PointerEvent::press_background(5.0, 5.0);
    assert_eq!(controller.handle(&mut store, &press, 1.0), Disposition::Consumed);
    assert!(store.selection().is_none());
}

// ============================================================================
// Element Lifecycle Tests
// ============================================================================

#[test]
fn test_split_title_with_synced_offsets() {
    let mut store = SceneStore::new();
    let id = store.texts()[0].id;

    let offsets = SplitOffsets::of(&store.texts()[0]).with(Run::Left, Axis::Y, -40.0, true);
    let mut patch = offsets.to_patch();
    patch.is_split = Some(true);
    assert!(store.update_text(id, patch));

    let composition = compose(&store);
    let group = composition
        .nodes
        .iter()
        .find(|n| n.kind == NodeKind::Element { element: ElementRef::text(id) })
        .expect("text group");
    let runs: Vec<(&str, f32)> = group
        .children
        .iter()
        .filter_map(|child| match &child.kind {
            NodeKind::TextRun { content, .. } => Some((content.as_str(), child.transform.translate_y)),
            _ => None,
        })
        .collect();
    assert_eq!(runs, vec![("封面", -40.0), ("标题", 40.0)]);
}

#[test]
fn test_duplicate_then_remove_selected() {
    let mut store = SceneStore::new();
    let original = store.texts()[0].id;

    let copy = store.duplicate_text(original).expect("duplicate");
    assert_eq!(store.selection(), Some(ElementRef::text(copy)));
    assert_eq!(store.texts()[1].position(), Point::new(20.0, 20.0));

    assert!(store.remove_text(copy));
    assert!(store.selection().is_none());

    // The original is now the only text and stays.
    assert!(!store.remove_text(original));
    assert_eq!(store.texts().len(), 1);
}

#[test]
fn test_remove_other_element_keeps_selection() {
    let mut store = SceneStore::new();
    let image = store.add_ai_image("data:image/png;base64,AAAA");
    let text = store.add_text();
    assert_eq!(store.selection(), Some(ElementRef::text(text)));

    assert!(store.remove_ai_image(image));
    assert_eq!(store.selection(), Some(ElementRef::text(text)));
}

#[test]
fn test_last_ratio_cannot_be_removed() {
    let mut store = SceneStore::new();
    assert!(!store.toggle_ratio(AspectRatio::Widescreen));
    assert_eq!(store.active_ratios().len(), 1);
}

// ============================================================================
// Export Tests
// ============================================================================

#[test]
fn test_export_after_drag_keeps_selection() {
    let mut store = SceneStore::new();
    let mut controller = InteractionController::new();
    let target = store.texts()[0].element_ref();
    drag(&mut controller, &mut store, target, (0.0, 0.0), (10.0, 10.0), 1.0);
    store.update_text(
        target.id,
        TextPatch {
            content: Some("Launch".to_string()),
            ..TextPatch::default()
        },
    );

    let full = compose(&store);
    let snapshot = export_snapshot(&mut store, &CountingRenderer).expect("export");

    let exported = usize::from_le_bytes(snapshot.bytes.try_into().expect("usize bytes"));
    // The 16:9 frame and the ruler are left out.
    assert_eq!(exported, full.node_count() - 2);
    assert_eq!(store.selection(), Some(target));
}
