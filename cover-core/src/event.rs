//! Pointer input for canvas interaction.

use serde::{Deserialize, Serialize};

use crate::element::ElementRef;
use crate::geometry::Point;

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    /// Button pressed.
    Down,
    /// Pointer moved.
    Move,
    /// Button released, anywhere in the window.
    Up,
}

/// A pointer event in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerEvent {
    /// Phase of this event.
    pub phase: PointerPhase,
    /// X position in viewport pixels.
    pub x: f32,
    /// Y position in viewport pixels.
    pub y: f32,
    /// Element whose hit region received a press, `None` for the background.
    pub target: Option<ElementRef>,
}

impl PointerEvent {
    /// Press on an element's hit region.
    #[must_use]
    pub fn press_on(target: ElementRef, x: f32, y: f32) -> Self {
        Self {
            phase: PointerPhase::Down,
            x,
            y,
            target: Some(target),
        }
    }

    /// Press on the canvas background.
    #[must_use]
    pub fn press_background(x: f32, y: f32) -> Self {
        Self {
            phase: PointerPhase::Down,
            x,
            y,
            target: None,
        }
    }

    /// Pointer movement.
    #[must_use]
    pub fn moved(x: f32, y: f32) -> Self {
        Self {
            phase: PointerPhase::Move,
            x,
            y,
            target: None,
        }
    }

    /// Pointer release.
    #[must_use]
    pub fn released(x: f32, y: f32) -> Self {
        Self {
            phase: PointerPhase::Up,
            x,
            y,
            target: None,
        }
    }

    /// Position of the pointer.
    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}
