//! Canvas elements - the building blocks of a cover.
//!
//! Three element kinds live in three separate collections of the
//! [`SceneStore`](crate::SceneStore). Positions are offsets of the element's
//! centroid from the canvas center, in unscaled scene units.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::Point;

/// Unique identifier for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse an ID from its string form.
    ///
    /// # Errors
    ///
    /// Returns an error if `s` is not a valid UUID.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which collection an element belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementType {
    /// A text element.
    Text,
    /// An icon element.
    Icon,
    /// A placed generated image.
    AiImage,
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Icon => "icon",
            Self::AiImage => "aiImage",
        })
    }
}

/// A typed pointer into one of the element collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef {
    /// Collection the element lives in.
    pub kind: ElementType,
    /// Element identifier within that collection.
    pub id: ElementId,
}

impl ElementRef {
    /// Reference a text element.
    #[must_use]
    pub const fn text(id: ElementId) -> Self {
        Self {
            kind: ElementType::Text,
            id,
        }
    }

    /// Reference an icon element.
    #[must_use]
    pub const fn icon(id: ElementId) -> Self {
        Self {
            kind: ElementType::Icon,
            id,
        }
    }

    /// Reference an AI image element.
    #[must_use]
    pub const fn ai_image(id: ElementId) -> Self {
        Self {
            kind: ElementType::AiImage,
            id,
        }
    }
}

/// Drop shadow settings shared by icons and the background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shadow {
    /// Whether the shadow is drawn.
    pub enabled: bool,
    /// CSS color string.
    pub color: String,
    /// Blur radius in scene units.
    pub blur: f32,
    /// Vertical offset in scene units.
    pub offset_y: f32,
}

/// A text label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct TextElement {
    pub id: ElementId,
    pub content: String,
    pub font_size: f32,
    pub color: String,
    pub stroke_color: String,
    pub stroke_width: f32,
    pub font_weight: u16,
    pub font: String,
    pub x: f32,
    pub y: f32,
    /// Rotation in degrees.
    pub rotation: f32,
    pub z_index: i32,
    /// Render the content as two independently offset runs.
    pub is_split: bool,
    pub left_offset_x: f32,
    pub left_offset_y: f32,
    pub right_offset_x: f32,
    pub right_offset_y: f32,
}

impl TextElement {
    /// Create a text element with default styling.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: ElementId::new(),
            content: content.into(),
            font_size: 160.0,
            color: "#000000".to_string(),
            stroke_color: "#ffffff".to_string(),
            stroke_width: 0.0,
            font_weight: 700,
            font: "Inter, sans-serif".to_string(),
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            z_index: 1,
            is_split: false,
            left_offset_x: 0.0,
            left_offset_y: 0.0,
            right_offset_x: 0.0,
            right_offset_y: 0.0,
        }
    }
}

/// The image shown by an icon. Exactly one source is active at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum IconSource {
    /// Symbolic icon identifier such as `logos:react`.
    Named(String),
    /// URL of a user-supplied image.
    Custom(String),
}

impl IconSource {
    /// Icon name, if this is a named icon.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Custom(_) => None,
        }
    }

    /// Custom image URL, if this is a custom icon.
    #[must_use]
    pub fn custom_url(&self) -> Option<&str> {
        match self {
            Self::Custom(url) => Some(url),
            Self::Named(_) => None,
        }
    }
}

/// Container shape drawn behind an icon glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackgroundShape {
    /// No container.
    None,
    /// Fully rounded container.
    Circle,
    /// Square corners.
    Square,
    /// Corners rounded by [`IconBackground::radius_px`].
    RoundedSquare,
}

/// Container behind an icon glyph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconBackground {
    /// Container shape.
    pub shape: BackgroundShape,
    /// Hex fill color.
    pub color: String,
    /// Fill opacity, 0 to 1.
    pub opacity: f32,
    /// Backdrop blur applied to the fill.
    pub blur_px: f32,
    /// Space between container edge and glyph.
    pub padding_px: f32,
    /// Corner radius, only meaningful for [`BackgroundShape::RoundedSquare`].
    pub radius_px: f32,
}

/// An icon, optionally framed by a container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct IconElement {
    pub id: ElementId,
    pub source: IconSource,
    pub size: f32,
    pub color: String,
    /// Rotation in degrees.
    pub rotation: f32,
    pub x: f32,
    pub y: f32,
    pub z_index: i32,
    pub shadow: Shadow,
    pub background: IconBackground,
    /// Corner radius applied to a custom icon image.
    pub custom_icon_radius: f32,
}

impl IconElement {
    /// Create a named icon with default card styling.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ElementId::new(),
            source: IconSource::Named(name.into()),
            size: 120.0,
            color: "#000000".to_string(),
            rotation: 0.0,
            x: 0.0,
            y: 0.0,
            z_index: 1,
            shadow: Shadow {
                enabled: true,
                color: "rgba(0,0,0,0.3)".to_string(),
                blur: 6.0,
                offset_y: 4.0,
            },
            background: IconBackground {
                shape: BackgroundShape::RoundedSquare,
                color: "#ffffff".to_string(),
                opacity: 1.0,
                blur_px: 0.0,
                padding_px: 40.0,
                radius_px: 40.0,
            },
            custom_icon_radius: 0.0,
        }
    }
}

/// A generated raster image placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct AiImageElement {
    pub id: ElementId,
    pub image_url: String,
    pub x: f32,
    pub y: f32,
    /// Rotation in degrees.
    pub rotation: f32,
    pub scale: f32,
    pub z_index: i32,
}

impl AiImageElement {
    /// Place `image_url` at the canvas center.
    #[must_use]
    pub fn new(image_url: impl Into<String>) -> Self {
        Self {
            id: ElementId::new(),
            image_url: image_url.into(),
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale: 1.0,
            z_index: 1,
        }
    }
}

/// Behaviour shared by every element kind.
pub trait Placed: Clone {
    /// Collection this kind lives in.
    const KIND: ElementType;

    /// Element identifier.
    fn id(&self) -> ElementId;
    /// Replace the identifier.
    fn set_id(&mut self, id: ElementId);
    /// Centroid offset from the canvas center.
    fn position(&self) -> Point;
    /// Move the centroid.
    fn set_position(&mut self, at: Point);
    /// Z-index within the collection.
    fn z_index(&self) -> i32;

    /// Typed reference to this element.
    fn element_ref(&self) -> ElementRef {
        ElementRef {
            kind: Self::KIND,
            id: self.id(),
        }
    }
}

macro_rules! impl_placed {
    ($ty:ty, $kind:expr) => {
        impl Placed for $ty {
            const KIND: ElementType = $kind;

            fn id(&self) -> ElementId {
                self.id
            }

            fn set_id(&mut self, id: ElementId) {
                self.id = id;
            }

            fn position(&self) -> Point {
                Point::new(self.x, self.y)
            }

            fn set_position(&mut self, at: Point) {
                self.x = at.x;
                self.y = at.y;
            }

            fn z_index(&self) -> i32 {
                self.z_index
            }
        }
    };
}

impl_placed!(TextElement, ElementType::Text);
impl_placed!(IconElement, ElementType::Icon);
impl_placed!(AiImageElement, ElementType::AiImage);

/// Borrowed view of any element, resolved from an [`ElementRef`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElementView<'a> {
    /// A text element.
    Text(&'a TextElement),
    /// An icon element.
    Icon(&'a IconElement),
    /// An AI image element.
    AiImage(&'a AiImageElement),
}

impl ElementView<'_> {
    /// Reference to the viewed element.
    #[must_use]
    pub fn element_ref(&self) -> ElementRef {
        match self {
            Self::Text(t) => t.element_ref(),
            Self::Icon(i) => i.element_ref(),
            Self::AiImage(a) => a.element_ref(),
        }
    }

    /// Centroid offset from the canvas center.
    #[must_use]
    pub fn position(&self) -> Point {
        match self {
            Self::Text(t) => t.position(),
            Self::Icon(i) => i.position(),
            Self::AiImage(a) => a.position(),
        }
    }
}

fn merge<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// Partial update for a [`TextElement`]. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct TextPatch {
    pub content: Option<String>,
    pub font_size: Option<f32>,
    pub color: Option<String>,
    pub stroke_color: Option<String>,
    pub stroke_width: Option<f32>,
    pub font_weight: Option<u16>,
    pub font: Option<String>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub rotation: Option<f32>,
    pub z_index: Option<i32>,
    pub is_split: Option<bool>,
    pub left_offset_x: Option<f32>,
    pub left_offset_y: Option<f32>,
    pub right_offset_x: Option<f32>,
    pub right_offset_y: Option<f32>,
}

impl TextPatch {
    /// Patch that only moves the element.
    #[must_use]
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Shallow-merge this patch into `text`.
    pub fn apply(self, text: &mut TextElement) {
        merge(&mut text.content, self.content);
        merge(&mut text.font_size, self.font_size);
        merge(&mut text.color, self.color);
        merge(&mut text.stroke_color, self.stroke_color);
        merge(&mut text.stroke_width, self.stroke_width);
        merge(&mut text.font_weight, self.font_weight);
        merge(&mut text.font, self.font);
        merge(&mut text.x, self.x);
        merge(&mut text.y, self.y);
        merge(&mut text.rotation, self.rotation);
        merge(&mut text.z_index, self.z_index);
        merge(&mut text.is_split, self.is_split);
        merge(&mut text.left_offset_x, self.left_offset_x);
        merge(&mut text.left_offset_y, self.left_offset_y);
        merge(&mut text.right_offset_x, self.right_offset_x);
        merge(&mut text.right_offset_y, self.right_offset_y);
    }
}

/// Partial update for an [`IconElement`]. Nested structs replace wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct IconPatch {
    /// Setting a source replaces the previous one, named or custom.
    pub source: Option<IconSource>,
    pub size: Option<f32>,
    pub color: Option<String>,
    pub rotation: Option<f32>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z_index: Option<i32>,
    pub shadow: Option<Shadow>,
    pub background: Option<IconBackground>,
    pub custom_icon_radius: Option<f32>,
}

impl IconPatch {
    /// Patch that only moves the element.
    #[must_use]
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Shallow-merge this patch into `icon`.
    pub fn apply(self, icon: &mut IconElement) {
        merge(&mut icon.source, self.source);
        merge(&mut icon.size, self.size);
        merge(&mut icon.color, self.color);
        merge(&mut icon.rotation, self.rotation);
        merge(&mut icon.x, self.x);
        merge(&mut icon.y, self.y);
        merge(&mut icon.z_index, self.z_index);
        merge(&mut icon.shadow, self.shadow);
        merge(&mut icon.background, self.background);
        merge(&mut icon.custom_icon_radius, self.custom_icon_radius);
    }
}

/// Partial update for an [`AiImageElement`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct AiImagePatch {
    pub image_url: Option<String>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub rotation: Option<f32>,
    pub scale: Option<f32>,
    pub z_index: Option<i32>,
}

impl AiImagePatch {
    /// Patch that only moves the element.
    #[must_use]
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Shallow-merge this patch into `image`.
    pub fn apply(self, image: &mut AiImageElement) {
        merge(&mut image.image_url, self.image_url);
        merge(&mut image.x, self.x);
        merge(&mut image.y, self.y);
        merge(&mut image.rotation, self.rotation);
        merge(&mut image.scale, self.scale);
        merge(&mut image.z_index, self.z_index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_patch_merges_only_set_fields() {
        let mut text = TextElement::new("Hello");
        let before = text.clone();
        TextPatch {
            color: Some("#ff0000".to_string()),
            x: Some(12.0),
            ..TextPatch::default()
        }
        .apply(&mut text);

        assert_eq!(text.color, "#ff0000");
        assert!((text.x - 12.0).abs() < f32::EPSILON);
        assert_eq!(text.content, before.content);
        assert_eq!(text.id, before.id);
    }

    #[test]
    fn test_patch_from_partial_json() {
        let patch: TextPatch =
            serde_json::from_str(r#"{"fontSize": 96, "isSplit": true}"#).expect("parse");
        assert_eq!(patch.font_size, Some(96.0));
        assert_eq!(patch.is_split, Some(true));
        assert!(patch.content.is_none());
    }

    #[test]
    fn test_icon_source_replaces_previous() {
        let mut icon = IconElement::new("logos:react");
        IconPatch {
            source: Some(IconSource::Custom("data:image/png;base64,AAAA".to_string())),
            ..IconPatch::default()
        }
        .apply(&mut icon);

        assert!(icon.source.name().is_none());
        assert_eq!(icon.source.custom_url(), Some("data:image/png;base64,AAAA"));
    }

    #[test]
    fn test_background_shape_serde() {
        let json = serde_json::to_string(&BackgroundShape::RoundedSquare).expect("serialize");
        assert_eq!(json, "\"rounded-square\"");
    }

    #[test]
    fn test_element_ref_from_view() {
        let image = AiImageElement::new("data:image/png;base64,AAAA");
        let view = ElementView::AiImage(&image);
        assert_eq!(view.element_ref(), ElementRef::ai_image(image.id));
        assert_eq!(view.position(), Point::new(0.0, 0.0));
    }
}
