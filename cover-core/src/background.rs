//! Background descriptor.

use serde::{Deserialize, Serialize};

use crate::element::Shadow;

/// Whether the background is a flat color or an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundKind {
    /// Flat color fill.
    Solid,
    /// Image placed with a "contain" fit, then transformed.
    Image,
}

/// Image placement on top of the implicit contain fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundTransform {
    /// Multiplier applied after the contain fit.
    pub scale: f32,
    /// Horizontal position in percent, 50 is centered.
    pub position_x: f32,
    /// Vertical position in percent, 50 is centered.
    pub position_y: f32,
    /// Rotation in degrees.
    pub rotation: f32,
}

impl Default for BackgroundTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            position_x: 50.0,
            position_y: 50.0,
            rotation: 0.0,
        }
    }
}

/// The canvas background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Background {
    /// Solid or image.
    #[serde(rename = "type")]
    pub kind: BackgroundKind,
    /// Fill color for solid backgrounds.
    pub color: String,
    /// Image source for image backgrounds; empty when unset.
    pub image_url: String,
    /// Blur applied to the image.
    pub blur_px: f32,
    /// Corner radius of the background layer.
    pub radius_px: f32,
    /// Layer opacity, 0 to 1.
    pub opacity: f32,
    /// Inner shadow.
    pub shadow: Shadow,
    /// Image placement.
    pub transform: BackgroundTransform,
}

impl Background {
    /// Image URL if this background currently shows an image.
    #[must_use]
    pub fn active_image(&self) -> Option<&str> {
        (self.kind == BackgroundKind::Image && !self.image_url.is_empty())
            .then_some(self.image_url.as_str())
    }
}

impl Default for Background {
    fn default() -> Self {
        Self {
            kind: BackgroundKind::Solid,
            color: "#f3f4f6".to_string(),
            image_url: String::new(),
            blur_px: 0.0,
            radius_px: 0.0,
            opacity: 1.0,
            shadow: Shadow {
                enabled: false,
                color: "rgba(0,0,0,0.3)".to_string(),
                blur: 30.0,
                offset_y: 10.0,
            },
            transform: BackgroundTransform::default(),
        }
    }
}

/// Partial update for the [`Background`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct BackgroundPatch {
    #[serde(rename = "type")]
    pub kind: Option<BackgroundKind>,
    pub color: Option<String>,
    pub image_url: Option<String>,
    pub blur_px: Option<f32>,
    pub radius_px: Option<f32>,
    pub opacity: Option<f32>,
    pub shadow: Option<Shadow>,
    pub transform: Option<BackgroundTransform>,
}

impl BackgroundPatch {
    /// Switch to an image background showing `url`.
    #[must_use]
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            kind: Some(BackgroundKind::Image),
            image_url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Switch to a solid background of `color`.
    #[must_use]
    pub fn solid(color: impl Into<String>) -> Self {
        Self {
            kind: Some(BackgroundKind::Solid),
            color: Some(color.into()),
            ..Self::default()
        }
    }

    /// Shallow-merge this patch into `background`.
    pub fn apply(self, background: &mut Background) {
        if let Some(kind) = self.kind {
            background.kind = kind;
        }
        if let Some(color) = self.color {
            background.color = color;
        }
        if let Some(url) = self.image_url {
            background.image_url = url;
        }
        if let Some(blur) = self.blur_px {
            background.blur_px = blur;
        }
        if let Some(radius) = self.radius_px {
            background.radius_px = radius;
        }
        if let Some(opacity) = self.opacity {
            background.opacity = opacity;
        }
        if let Some(shadow) = self.shadow {
            background.shadow = shadow;
        }
        if let Some(transform) = self.transform {
            background.transform = transform;
        }
    }
}

/// How [`SceneStore::fit_background`](crate::SceneStore::fit_background) sizes the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Whole image visible, gaps allowed.
    Contain,
    /// Canvas fully filled, cropping allowed.
    Cover,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_image_requires_kind_and_url() {
        let mut background = Background::default();
        assert!(background.active_image().is_none());

        background.image_url = "bg.png".to_string();
        assert!(background.active_image().is_none());

        BackgroundPatch::image("bg.png").apply(&mut background);
        assert_eq!(background.active_image(), Some("bg.png"));
    }

    #[test]
    fn test_patch_keeps_untouched_fields() {
        let mut background = Background::default();
        BackgroundPatch {
            blur_px: Some(8.0),
            ..BackgroundPatch::default()
        }
        .apply(&mut background);
        assert!((background.blur_px - 8.0).abs() < f32::EPSILON);
        assert_eq!(background.color, "#f3f4f6");
        assert_eq!(background.transform, BackgroundTransform::default());
    }

    #[test]
    fn test_patch_type_field_name() {
        let patch: BackgroundPatch =
            serde_json::from_str(r#"{"type":"image","imageUrl":"a.png"}"#).expect("parse");
        assert_eq!(patch.kind, Some(BackgroundKind::Image));
        assert_eq!(patch.image_url.as_deref(), Some("a.png"));
    }
}
