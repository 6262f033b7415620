//! Ratio catalog and fit computations.
//!
//! Everything here is pure. Sizes are in scene units unless stated otherwise;
//! a scene unit becomes a viewport pixel only after multiplying by the view
//! scale returned from [`view_scale`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CanvasError;

/// Canvas size used when no ratio is active.
pub const FALLBACK_CANVAS: Size = Size::new(1000.0, 1000.0);

/// Padding (per axis, in viewport pixels) kept free around the canvas.
pub const DEFAULT_VIEW_PADDING: f32 = 80.0;

/// Shrink factor applied after fitting, leaving a visual margin.
pub const DEFAULT_VIEW_SHRINK: f32 = 0.9;

/// Smallest view scale ever returned by [`view_scale`].
pub const MIN_VIEW_SCALE: f32 = 0.01;

/// Multiplier added on top of a cover scale to hide sub-pixel seams.
pub const COVER_SEAM_BUFFER: f32 = 1.01;

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Size {
    /// Create a new size.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Width divided by height, or `None` for a degenerate size.
    #[must_use]
    pub fn aspect(self) -> Option<f32> {
        if self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
        {
            Some(self.width / self.height)
        } else {
            None
        }
    }
}

/// A 2D point or offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An output aspect ratio from the fixed catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 1:1, 900×900.
    #[serde(rename = "1:1")]
    Square,
    /// 16:9, 1600×900.
    #[serde(rename = "16:9")]
    Widescreen,
    /// 21:9, 2100×900.
    #[serde(rename = "21:9")]
    UltraWide,
    /// 4:3, 1200×900.
    #[serde(rename = "4:3")]
    Standard,
    /// 3:4, 900×1200.
    #[serde(rename = "3:4")]
    Portrait,
    /// 2:1, 1800×900.
    #[serde(rename = "2:1")]
    Panorama,
}

impl AspectRatio {
    /// The whole catalog, in display order.
    pub const ALL: [Self; 6] = [
        Self::Square,
        Self::Widescreen,
        Self::UltraWide,
        Self::Standard,
        Self::Portrait,
        Self::Panorama,
    ];

    /// Human-readable label such as `"16:9"`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Widescreen => "16:9",
            Self::UltraWide => "21:9",
            Self::Standard => "4:3",
            Self::Portrait => "3:4",
            Self::Panorama => "2:1",
        }
    }

    /// Frame size of this ratio in scene units.
    #[must_use]
    pub const fn frame(self) -> Size {
        match self {
            Self::Square => Size::new(900.0, 900.0),
            Self::Widescreen => Size::new(1600.0, 900.0),
            Self::UltraWide => Size::new(2100.0, 900.0),
            Self::Standard => Size::new(1200.0, 900.0),
            Self::Portrait => Size::new(900.0, 1200.0),
            Self::Panorama => Size::new(1800.0, 900.0),
        }
    }

    /// Look a ratio up by its label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.label() == label.trim())
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AspectRatio {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| CanvasError::UnknownRatio(s.to_string()))
    }
}

/// Smallest box containing every active ratio frame, all frames centered.
///
/// Returns [`FALLBACK_CANVAS`] when `ratios` is empty.
#[must_use]
pub fn canvas_bounds(ratios: &[AspectRatio]) -> Size {
    if ratios.is_empty() {
        return FALLBACK_CANVAS;
    }
    ratios.iter().fold(Size::new(0.0, 0.0), |acc, ratio| {
        let frame = ratio.frame();
        Size::new(acc.width.max(frame.width), acc.height.max(frame.height))
    })
}

/// Top-left corner of `ratio`'s frame when centered inside `canvas`.
#[must_use]
pub fn frame_origin(canvas: Size, ratio: AspectRatio) -> Point {
    let frame = ratio.frame();
    Point::new(
        (canvas.width - frame.width) / 2.0,
        (canvas.height - frame.height) / 2.0,
    )
}

/// Scale that fits `canvas` into `container` minus `padding` on each axis.
///
/// The lesser axis ratio is multiplied by `shrink` and floored at
/// [`MIN_VIEW_SCALE`]. A degenerate canvas yields `1.0`.
#[must_use]
pub fn view_scale(canvas: Size, container: Size, padding: f32, shrink: f32) -> f32 {
    if canvas.aspect().is_none() {
        return 1.0;
    }
    let available_w = (container.width - padding).max(0.0);
    let available_h = (container.height - padding).max(0.0);
    let scale = (available_w / canvas.width).min(available_h / canvas.height) * shrink;
    if scale.is_finite() {
        scale.max(MIN_VIEW_SCALE)
    } else {
        MIN_VIEW_SCALE
    }
}

/// Multiplier on top of a "contain" placement that makes the image cover the canvas.
///
/// Always `>= 1`, exactly `1` for equal aspects. Non-positive or non-finite
/// input yields `1.0`.
#[must_use]
pub fn cover_scale(image_aspect: f32, canvas_aspect: f32) -> f32 {
    let valid = |a: f32| a.is_finite() && a > 0.0;
    if !valid(image_aspect) || !valid(canvas_aspect) {
        return 1.0;
    }
    if image_aspect > canvas_aspect {
        image_aspect / canvas_aspect
    } else {
        canvas_aspect / image_aspect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_single_ratio() {
        let size = canvas_bounds(&[AspectRatio::Widescreen]);
        assert_eq!(size, Size::new(1600.0, 900.0));
    }

    #[test]
    fn test_bounds_mixed_orientation() {
        let size = canvas_bounds(&[AspectRatio::UltraWide, AspectRatio::Portrait]);
        assert_eq!(size, Size::new(2100.0, 1200.0));

        let origin = frame_origin(size, AspectRatio::Portrait);
        assert_eq!(origin, Point::new(600.0, 0.0));
        let origin = frame_origin(size, AspectRatio::UltraWide);
        assert_eq!(origin, Point::new(0.0, 150.0));
    }

    #[test]
    fn test_bounds_empty_uses_fallback() {
        assert_eq!(canvas_bounds(&[]), FALLBACK_CANVAS);
    }

    #[test]
    fn test_ratio_labels_round_trip() {
        for ratio in AspectRatio::ALL {
            assert_eq!(ratio.label().parse::<AspectRatio>().ok(), Some(ratio));
        }
        assert!(matches!(
            "5:4".parse::<AspectRatio>(),
            Err(CanvasError::UnknownRatio(_))
        ));
    }

    #[test]
    fn test_ratio_serde_uses_label() {
        let json = serde_json::to_string(&AspectRatio::Widescreen).expect("serialize");
        assert_eq!(json, "\"16:9\"");
    }

    #[test]
    fn test_view_scale_fits_smaller_axis() {
        // 1600x900 into 1680x980 with 80 padding -> 1600x900 available -> 1.0 * 0.9
        let scale = view_scale(
            Size::new(1600.0, 900.0),
            Size::new(1680.0, 980.0),
            DEFAULT_VIEW_PADDING,
            DEFAULT_VIEW_SHRINK,
        );
        assert!((scale - 0.9).abs() < 1e-6);

        let scale = view_scale(Size::new(1600.0, 900.0), Size::new(880.0, 2000.0), 80.0, 1.0);
        assert!((scale - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_view_scale_floor() {
        let scale = view_scale(Size::new(1600.0, 900.0), Size::new(10.0, 10.0), 80.0, 0.9);
        assert!((scale - MIN_VIEW_SCALE).abs() < f32::EPSILON);
    }

    #[test]
    fn test_view_scale_degenerate_canvas() {
        let scale = view_scale(Size::new(0.0, 900.0), Size::new(800.0, 600.0), 80.0, 0.9);
        assert!((scale - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_cover_scale_wide_image() {
        // 2:1 image on a 1:1 canvas needs 2x to fill vertically
        assert!((cover_scale(2.0, 1.0) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_cover_scale_tall_image() {
        // 1:2 image on a 16:9 canvas
        let expected = (16.0 / 9.0) / 0.5;
        assert!((cover_scale(0.5, 16.0 / 9.0) - expected).abs() < 1e-5);
    }

    #[test]
    fn test_cover_scale_equal_aspect_is_one() {
        let aspect = 16.0_f32 / 9.0;
        assert!((cover_scale(aspect, aspect) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_cover_scale_invalid_input() {
        assert!((cover_scale(0.0, 1.0) - 1.0).abs() < f32::EPSILON);
        assert!((cover_scale(f32::NAN, 1.0) - 1.0).abs() < f32::EPSILON);
    }
}
