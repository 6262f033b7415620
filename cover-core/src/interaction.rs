//! Drag state machine.
//!
//! ```text
//!            press on element
//!   ┌──────┐ ───────────────▶ ┌──────────┐
//!   │ Idle │                  │ Dragging │ ◀─┐ pointer move
//!   └──────┘ ◀─────────────── └──────────┘ ──┘
//!              release
//! ```
//!
//! A press on an element selects it and opens a [`DragSession`]; each move
//! writes `origin + (pointer - press) / view_scale` back to the store, so the
//! last move is the committed position. Release ends the session wherever the
//! pointer is. There is no cancel.
//!
//! Move and release events only matter while dragging. Hosts that need to
//! subscribe to window-wide pointer events for that span plug a
//! [`PointerCapture`] into the controller: it is acquired when a session
//! begins and released exactly once when it ends (or when the controller is
//! dropped mid-drag).

use tracing::{debug, trace};

use crate::element::ElementRef;
use crate::event::{PointerEvent, PointerPhase};
use crate::geometry::Point;
use crate::store::SceneStore;

/// Scoped subscription to window-wide pointer move/release events.
pub trait PointerCapture {
    /// Start receiving move and release events.
    fn acquire(&mut self);
    /// Stop receiving them.
    fn release(&mut self);
}

/// Capture for hosts that always deliver every pointer event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapture;

impl PointerCapture for NoCapture {
    fn acquire(&mut self) {}
    fn release(&mut self) {}
}

/// Data captured when a drag begins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    /// Element being dragged.
    pub target: ElementRef,
    /// Pointer position at press, in viewport pixels.
    pub press: Point,
    /// Element position at press, in scene units.
    pub origin: Point,
}

impl DragSession {
    /// Element position for the pointer at `pointer` under `view_scale`.
    #[must_use]
    pub fn position_for(&self, pointer: Point, view_scale: f32) -> Point {
        Point::new(
            self.origin.x + (pointer.x - self.press.x) / view_scale,
            self.origin.y + (pointer.y - self.press.y) / view_scale,
        )
    }
}

/// Controller state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum DragState {
    /// No drag in progress.
    #[default]
    Idle,
    /// An element follows the pointer.
    Dragging(DragSession),
}

/// Whether an event was handled by the controller.
///
/// A consumed press must not reach any "deselect on background" handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Handled; stop propagation.
    Consumed,
    /// Not handled.
    Ignored,
}

/// Turns pointer input into store mutations.
#[derive(Debug, Default)]
pub struct InteractionController<C: PointerCapture = NoCapture> {
    state: DragState,
    capture: C,
}

impl InteractionController<NoCapture> {
    /// Create an idle controller without pointer capture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: PointerCapture> InteractionController<C> {
    /// Create an idle controller using `capture` for the lifetime of each drag.
    pub fn with_capture(capture: C) -> Self {
        Self {
            state: DragState::Idle,
            capture,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> DragState {
        self.state
    }

    /// Whether a drag session is open.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// The pointer capture.
    #[must_use]
    pub fn capture(&self) -> &C {
        &self.capture
    }

    /// Press on an element's hit region: select it and start dragging.
    ///
    /// A press on a missing element is ignored. A press while already
    /// dragging ends the previous session first.
    pub fn press_element(
        &mut self,
        store: &mut SceneStore,
        target: ElementRef,
        pointer: Point,
    ) -> Disposition {
        let Some(origin) = store.element(target).map(|view| view.position()) else {
            debug!("Press on missing {} {}", target.kind, target.id);
            return Disposition::Ignored;
        };
        if self.is_dragging() {
            self.release();
        }
        store.select(Some(target));
        self.state = DragState::Dragging(DragSession {
            target,
            press: pointer,
            origin,
        });
        self.capture.acquire();
        debug!("Drag started on {} {}", target.kind, target.id);
        Disposition::Consumed
    }

    /// Press on the canvas background: clear the selection when idle.
    pub fn press_background(&mut self, store: &mut SceneStore) -> Disposition {
        if self.is_dragging() {
            return Disposition::Ignored;
        }
        store.select(None);
        Disposition::Consumed
    }

    /// Move the dragged element to follow `pointer`.
    ///
    /// Returns `true` if the store was updated. Moves while idle and moves
    /// with a non-positive or non-finite `view_scale` are ignored. If the
    /// dragged element disappeared, the session ends.
    pub fn pointer_move(&mut self, store: &mut SceneStore, pointer: Point, view_scale: f32) -> bool {
        let DragState::Dragging(session) = self.state else {
            return false;
        };
        if !(view_scale.is_finite() && view_scale > 0.0) {
            debug!("Ignoring move with view scale {view_scale}");
            return false;
        }
        let position = session.position_for(pointer, view_scale);
        trace!("Drag {} to ({}, {})", session.target.id, position.x, position.y);
        if store.set_position(session.target, position) {
            true
        } else {
            self.release();
            false
        }
    }

    /// End the drag session, returning the element that was dragged.
    pub fn release(&mut self) -> Option<ElementRef> {
        match std::mem::take(&mut self.state) {
            DragState::Dragging(session) => {
                self.capture.release();
                debug!("Drag ended on {} {}", session.target.kind, session.target.id);
                Some(session.target)
            }
            DragState::Idle => None,
        }
    }

    /// Dispatch a pointer event.
    pub fn handle(
        &mut self,
        store: &mut SceneStore,
        event: &PointerEvent,
        view_scale: f32,
    ) -> Disposition {
        match event.phase {
            PointerPhase::Down => match event.target {
                Some(target) => self.press_element(store, target, event.position()),
                None => self.press_background(store),
            },
            PointerPhase::Move => {
                if self.pointer_move(store, event.position(), view_scale) {
                    Disposition::Consumed
                } else {
                    Disposition::Ignored
                }
            }
            PointerPhase::Up => {
                if self.release().is_some() {
                    Disposition::Consumed
                } else {
                    Disposition::Ignored
                }
            }
        }
    }
}

impl<C: PointerCapture> Drop for InteractionController<C> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementId, Placed};

    #[derive(Debug, Default)]
    struct CountingCapture {
        acquired: u32,
        released: u32,
    }

    impl PointerCapture for CountingCapture {
        fn acquire(&mut self) {
            self.acquired += 1;
        }

        fn release(&mut self) {
            self.released += 1;
        }
    }

    fn first_text(store: &SceneStore) -> ElementRef {
        store.texts()[0].element_ref()
    }

    #[test]
    fn test_press_selects_and_drags() {
        let mut store = SceneStore::new();
        let mut controller = InteractionController::new();
        let target = first_text(&store);

        let disposition = controller.press_element(&mut store, target, Point::new(10.0, 10.0));
        assert_eq!(disposition, Disposition::Consumed);
        assert_eq!(store.selection(), Some(target));
        assert!(controller.is_dragging());
    }

    #[test]
    fn test_move_divides_by_scale() {
        let mut store = SceneStore::new();
        let mut controller = InteractionController::new();
        let target = first_text(&store);

        controller.press_element(&mut store, target, Point::new(100.0, 100.0));
        assert!(controller.pointer_move(&mut store, Point::new(150.0, 130.0), 0.5));

        let position = store.element(target).expect("text").position();
        assert!((position.x - 100.0).abs() < 1e-4);
        assert!((position.y - 60.0).abs() < 1e-4);
    }

    #[test]
    fn test_move_while_idle_ignored() {
        let mut store = SceneStore::new();
        let mut controller = InteractionController::new();
        let revision = store.revision();
        assert!(!controller.pointer_move(&mut store, Point::new(5.0, 5.0), 1.0));
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn test_invalid_scale_ignored() {
        let mut store = SceneStore::new();
        let mut controller = InteractionController::new();
        let target = first_text(&store);
        controller.press_element(&mut store, target, Point::new(0.0, 0.0));

        assert!(!controller.pointer_move(&mut store, Point::new(5.0, 5.0), 0.0));
        assert!(!controller.pointer_move(&mut store, Point::new(5.0, 5.0), f32::NAN));
        assert!(controller.is_dragging());
    }

    #[test]
    fn test_press_missing_element_ignored() {
        let mut store = SceneStore::new();
        let mut controller = InteractionController::new();
        let disposition = controller.press_element(
            &mut store,
            ElementRef::icon(ElementId::new()),
            Point::new(0.0, 0.0),
        );
        assert_eq!(disposition, Disposition::Ignored);
        assert!(!controller.is_dragging());
    }

    #[test]
    fn test_background_press_clears_only_when_idle() {
        let mut store = SceneStore::new();
        let mut controller = InteractionController::new();
        let target = first_text(&store);

        controller.press_element(&mut store, target, Point::new(0.0, 0.0));
        assert_eq!(controller.press_background(&mut store), Disposition::Ignored);
        assert_eq!(store.selection(), Some(target));

        controller.release();
        assert_eq!(controller.press_background(&mut store), Disposition::Consumed);
        assert!(store.selection().is_none());
    }

    #[test]
    fn test_capture_scoped_to_session() {
        let mut store = SceneStore::new();
        let mut controller = InteractionController::with_capture(CountingCapture::default());
        let target = first_text(&store);

        controller.press_element(&mut store, target, Point::new(0.0, 0.0));
        assert_eq!(controller.capture().acquired, 1);
        assert_eq!(controller.capture().released, 0);

        assert_eq!(controller.release(), Some(target));
        assert_eq!(controller.release(), None);
        assert_eq!(controller.capture().released, 1);
    }

    #[test]
    fn test_removed_target_ends_session() {
        let mut store = SceneStore::new();
        let mut controller = InteractionController::with_capture(CountingCapture::default());
        let image = store.add_ai_image("a.png");
        let target = ElementRef::ai_image(image);

        controller.press_element(&mut store, target, Point::new(0.0, 0.0));
        store.remove(target);

        assert!(!controller.pointer_move(&mut store, Point::new(10.0, 10.0), 1.0));
        assert!(!controller.is_dragging());
        assert_eq!(controller.capture().released, 1);
    }

    #[test]
    fn test_handle_dispatches_phases() {
        let mut store = SceneStore::new();
        let mut controller = InteractionController::new();
        let target = first_text(&store);

        let down = PointerEvent::press_on(target, 0.0, 0.0);
        assert_eq!(controller.handle(&mut store, &down, 1.0), Disposition::Consumed);
        let moved = PointerEvent::moved(30.0, -10.0);
        assert_eq!(controller.handle(&mut store, &moved, 1.0), Disposition::Consumed);
        let up = PointerEvent::released(500.0, 500.0);
        assert_eq!(controller.handle(&mut store, &up, 1.0), Disposition::Consumed);

        let position = store.element(target).expect("text").position();
        assert_eq!(position, Point::new(30.0, -10.0));
        assert_eq!(controller.state(), DragState::Idle);
    }
}
