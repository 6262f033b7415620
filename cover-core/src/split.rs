//! Split-text runs and their offset controls.
//!
//! A split text renders its content as a left and a right run. The split point
//! is `ceil(n / 2)` counted in characters, so `"封面标题"` becomes `"封面"` and
//! `"标题"`, and an odd-length string puts the extra character on the left.

use serde::{Deserialize, Serialize};

use crate::element::{TextElement, TextPatch};

/// Partition `content` at the ceiling midpoint of its character count.
///
/// Content of one character or less yields `(content, "")`.
#[must_use]
pub fn split_runs(content: &str) -> (&str, &str) {
    let count = content.chars().count();
    if count <= 1 {
        return (content, "");
    }
    let mid = count.div_ceil(2);
    let byte_mid = content
        .char_indices()
        .nth(mid)
        .map_or(content.len(), |(idx, _)| idx);
    content.split_at(byte_mid)
}

/// Offset axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Horizontal.
    X,
    /// Vertical.
    Y,
}

/// Which run an offset applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Run {
    /// First half of the content.
    Left,
    /// Second half of the content.
    Right,
}

impl Run {
    const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Offsets of both runs, in scene units relative to the element's center.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct SplitOffsets {
    pub left_x: f32,
    pub left_y: f32,
    pub right_x: f32,
    pub right_y: f32,
}

impl SplitOffsets {
    /// Read the offsets of a text element.
    #[must_use]
    pub fn of(text: &TextElement) -> Self {
        Self {
            left_x: text.left_offset_x,
            left_y: text.left_offset_y,
            right_x: text.right_offset_x,
            right_y: text.right_offset_y,
        }
    }

    /// Offset of one run along one axis.
    #[must_use]
    pub fn get(&self, run: Run, axis: Axis) -> f32 {
        match (run, axis) {
            (Run::Left, Axis::X) => self.left_x,
            (Run::Left, Axis::Y) => self.left_y,
            (Run::Right, Axis::X) => self.right_x,
            (Run::Right, Axis::Y) => self.right_y,
        }
    }

    fn slot(&mut self, run: Run, axis: Axis) -> &mut f32 {
        match (run, axis) {
            (Run::Left, Axis::X) => &mut self.left_x,
            (Run::Left, Axis::Y) => &mut self.left_y,
            (Run::Right, Axis::X) => &mut self.right_x,
            (Run::Right, Axis::Y) => &mut self.right_y,
        }
    }

    /// Set one run's offset. With `sync`, the other run mirrors it on the same axis.
    #[must_use]
    pub fn with(mut self, run: Run, axis: Axis, value: f32, sync: bool) -> Self {
        *self.slot(run, axis) = value;
        if sync {
            *self.slot(run.opposite(), axis) = -value;
        }
        self
    }

    /// Patch writing all four offsets.
    #[must_use]
    pub fn to_patch(self) -> TextPatch {
        TextPatch {
            left_offset_x: Some(self.left_x),
            left_offset_y: Some(self.left_y),
            right_offset_x: Some(self.right_x),
            right_offset_y: Some(self.right_y),
            ..TextPatch::default()
        }
    }
}

/// A named offset arrangement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitPreset {
    /// Display name.
    pub name: &'static str,
    /// Offsets applied by the preset.
    pub offsets: SplitOffsets,
}

const fn preset(name: &'static str, left: (f32, f32), right: (f32, f32)) -> SplitPreset {
    SplitPreset {
        name,
        offsets: SplitOffsets {
            left_x: left.0,
            left_y: left.1,
            right_x: right.0,
            right_y: right.1,
        },
    }
}

/// Built-in offset arrangements.
pub const SPLIT_PRESETS: [SplitPreset; 5] = [
    preset("default", (0.0, 0.0), (0.0, 0.0)),
    preset("stagger", (0.0, -40.0), (0.0, 40.0)),
    preset("spread", (-60.0, 0.0), (60.0, 0.0)),
    preset("diagonal", (-40.0, -40.0), (40.0, 40.0)),
    preset("gather", (20.0, 0.0), (-20.0, 0.0)),
];
