//! Scene store → render tree.
//!
//! [`compose`] flattens a [`SceneStore`] into a [`Composition`]: an ordered
//! list of [`RenderNode`]s that an external renderer paints back to front.
//!
//! Layering is background, inner shadow, texts, icons, AI images, then the
//! editing overlays (ratio frames and the ruler). Inside each collection
//! elements are ordered by `z_index`, ties keeping insertion order.
//!
//! Element groups are anchored at the canvas center: translate by `(x, y)`,
//! then rotate about the element's own center. Split text adds one child per
//! run with its own translate; both runs sit inside the element's transform.
//!
//! Overlay nodes carry `export_excluded`. [`Composition::exportable`] drops
//! them and nothing else.

use serde::{Deserialize, Serialize};

use crate::background::BackgroundTransform;
use crate::color::Rgba;
use crate::element::{
    AiImageElement, BackgroundShape, ElementRef, IconBackground, IconElement, IconSource, Placed,
    Shadow, TextElement,
};
use crate::error::CanvasResult;
use crate::geometry::{self, AspectRatio, Size};
use crate::split::split_runs;
use crate::store::SceneStore;

/// Grid spacing of the ruler overlay, in scene units.
pub const RULER_SPACING: f32 = 100.0;

/// Where a node's translate is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Anchor {
    /// Offset of the node's center from the parent's center.
    Center,
    /// Offset of the node's top-left corner from the parent's top-left corner.
    TopLeft,
}

/// Translate-then-rotate transform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTransform {
    /// Horizontal translation in scene units.
    pub translate_x: f32,
    /// Vertical translation in scene units.
    pub translate_y: f32,
    /// Rotation in degrees about the node's center.
    pub rotation: f32,
}

impl NodeTransform {
    /// Pure translation.
    #[must_use]
    pub const fn translate(x: f32, y: f32) -> Self {
        Self {
            translate_x: x,
            translate_y: y,
            rotation: 0.0,
        }
    }
}

/// Corner rounding of an icon container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum CornerRadius {
    /// Fully rounded.
    Full,
    /// Fixed radius in scene units.
    Px(f32),
}

/// Background paint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BackgroundFill {
    /// Flat color.
    Solid {
        /// CSS color.
        color: String,
    },
    /// Contain-fitted image with an extra placement transform.
    Image {
        /// Image source.
        url: String,
        /// Placement on top of the contain fit.
        transform: BackgroundTransform,
    },
}

/// What a node paints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeKind {
    /// Full-canvas background layer.
    #[serde(rename_all = "camelCase")]
    Background {
        /// Paint.
        fill: BackgroundFill,
        /// Blur in scene units.
        blur_px: f32,
        /// Corner radius.
        radius_px: f32,
        /// Layer opacity.
        opacity: f32,
    },
    /// Inset shadow drawn over the background.
    #[serde(rename_all = "camelCase")]
    InnerShadow {
        /// CSS color.
        color: String,
        /// Blur radius.
        blur: f32,
        /// Vertical offset.
        offset_y: f32,
    },
    /// Group for one element; children carry the paint.
    Element {
        /// Element the group was built from.
        element: ElementRef,
    },
    /// A run of text.
    #[serde(rename_all = "camelCase")]
    TextRun {
        /// Text to draw.
        content: String,
        /// Font size.
        font_size: f32,
        /// Font weight.
        font_weight: u16,
        /// Font family list.
        font: String,
        /// Fill color.
        color: String,
        /// Stroke color.
        stroke_color: String,
        /// Stroke width, 0 disables the stroke.
        stroke_width: f32,
    },
    /// Container behind an icon glyph. Opacity and blur stop here.
    #[serde(rename_all = "camelCase")]
    IconContainer {
        /// Edge length, glyph size plus padding on both sides.
        size: f32,
        /// Fill with opacity folded into alpha.
        fill: Rgba,
        /// Backdrop blur.
        blur_px: f32,
        /// Corner rounding.
        corner: CornerRadius,
    },
    /// The icon itself.
    #[serde(rename_all = "camelCase")]
    IconGlyph {
        /// Named or custom source.
        source: IconSource,
        /// Edge length.
        size: f32,
        /// Tint for named icons.
        color: String,
        /// Corner radius for custom images.
        corner_radius: f32,
        /// Drop shadow, when enabled.
        shadow: Option<Shadow>,
    },
    /// A generated raster image.
    AiImage {
        /// Image source.
        url: String,
        /// Scale factor.
        scale: f32,
    },
    /// Outline of one output ratio.
    RatioFrame {
        /// Ratio outlined.
        ratio: AspectRatio,
        /// Frame size.
        size: Size,
    },
    /// Grid overlay.
    Ruler {
        /// Grid spacing.
        spacing: f32,
    },
}

/// One node of the render tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderNode {
    /// What to paint.
    pub kind: NodeKind,
    /// Placement relative to the parent.
    pub transform: NodeTransform,
    /// Reference point of `transform`.
    pub anchor: Anchor,
    /// Z-index within the node's layer.
    pub z_index: i32,
    /// Whether the node is the current selection.
    pub selected: bool,
    /// Editing-only overlay, omitted from exports.
    pub export_excluded: bool,
    /// Nested nodes, painted in order.
    pub children: Vec<RenderNode>,
}

impl RenderNode {
    fn new(kind: NodeKind, transform: NodeTransform, anchor: Anchor) -> Self {
        Self {
            kind,
            transform,
            anchor,
            z_index: 0,
            selected: false,
            export_excluded: false,
            children: Vec::new(),
        }
    }

    fn overlay(mut self) -> Self {
        self.export_excluded = true;
        self
    }

    fn without_excluded(&self) -> Option<Self> {
        if self.export_excluded {
            return None;
        }
        Some(Self {
            children: self
                .children
                .iter()
                .filter_map(Self::without_excluded)
                .collect(),
            ..self.clone()
        })
    }

    fn count(&self) -> usize {
        1 + self.children.iter().map(Self::count).sum::<usize>()
    }
}

/// A composed frame ready for a renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Composition {
    /// Canvas size in scene units.
    pub canvas: Size,
    /// Top-level nodes, back to front.
    pub nodes: Vec<RenderNode>,
}

impl Composition {
    /// Copy with every export-excluded node removed, at any depth.
    #[must_use]
    pub fn exportable(&self) -> Self {
        Self {
            canvas: self.canvas,
            nodes: self
                .nodes
                .iter()
                .filter_map(RenderNode::without_excluded)
                .collect(),
        }
    }

    /// Total number of nodes, nested ones included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.iter().map(RenderNode::count).sum()
    }

    /// Serialize to JSON for an external renderer.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> CanvasResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Build the render tree for the store's current state.
#[must_use]
pub fn compose(store: &SceneStore) -> Composition {
    let canvas = store.canvas_size();
    let selection = store.selection();
    let mut nodes = Vec::new();

    let background = store.background();
    let fill = match background.active_image() {
        Some(url) => BackgroundFill::Image {
            url: url.to_string(),
            transform: background.transform,
        },
        None => BackgroundFill::Solid {
            color: background.color.clone(),
        },
    };
    nodes.push(RenderNode::new(
        NodeKind::Background {
            fill,
            blur_px: background.blur_px,
            radius_px: background.radius_px,
            opacity: background.opacity,
        },
        NodeTransform::default(),
        Anchor::TopLeft,
    ));
    if background.shadow.enabled {
        nodes.push(RenderNode::new(
            NodeKind::InnerShadow {
                color: background.shadow.color.clone(),
                blur: background.shadow.blur,
                offset_y: background.shadow.offset_y,
            },
            NodeTransform::default(),
            Anchor::TopLeft,
        ));
    }

    push_layer(&mut nodes, store.texts(), selection, text_children);
    push_layer(&mut nodes, store.icons(), selection, icon_children);
    push_layer(&mut nodes, store.ai_images(), selection, ai_image_children);

    for ratio in store.active_ratios() {
        let origin = geometry::frame_origin(canvas, *ratio);
        nodes.push(
            RenderNode::new(
                NodeKind::RatioFrame {
                    ratio: *ratio,
                    size: ratio.frame(),
                },
                NodeTransform::translate(origin.x, origin.y),
                Anchor::TopLeft,
            )
            .overlay(),
        );
    }
    if store.show_ruler() {
        nodes.push(
            RenderNode::new(
                NodeKind::Ruler {
                    spacing: RULER_SPACING,
                },
                NodeTransform::default(),
                Anchor::TopLeft,
            )
            .overlay(),
        );
    }

    Composition { canvas, nodes }
}

trait Rotated {
    fn rotation(&self) -> f32;
}

impl Rotated for TextElement {
    fn rotation(&self) -> f32 {
        self.rotation
    }
}

impl Rotated for IconElement {
    fn rotation(&self) -> f32 {
        self.rotation
    }
}

impl Rotated for AiImageElement {
    fn rotation(&self) -> f32 {
        self.rotation
    }
}

fn push_layer<T: Placed + Rotated>(
    nodes: &mut Vec<RenderNode>,
    elements: &[T],
    selection: Option<ElementRef>,
    children: fn(&T) -> Vec<RenderNode>,
) {
    let mut ordered: Vec<&T> = elements.iter().collect();
    ordered.sort_by_key(|element| element.z_index());
    nodes.extend(ordered.into_iter().map(|element| {
        let position = element.position();
        let element_ref = element.element_ref();
        RenderNode {
            kind: NodeKind::Element {
                element: element_ref,
            },
            transform: NodeTransform {
                translate_x: position.x,
                translate_y: position.y,
                rotation: element.rotation(),
            },
            anchor: Anchor::Center,
            z_index: element.z_index(),
            selected: selection == Some(element_ref),
            export_excluded: false,
            children: children(element),
        }
    }));
}

fn text_run(text: &TextElement, content: &str, x: f32, y: f32) -> RenderNode {
    RenderNode::new(
        NodeKind::TextRun {
            content: content.to_string(),
            font_size: text.font_size,
            font_weight: text.font_weight,
            font: text.font.clone(),
            color: text.color.clone(),
            stroke_color: text.stroke_color.clone(),
            stroke_width: text.stroke_width,
        },
        NodeTransform::translate(x, y),
        Anchor::Center,
    )
}

fn text_children(text: &TextElement) -> Vec<RenderNode> {
    if !text.is_split {
        return vec![text_run(text, &text.content, 0.0, 0.0)];
    }
    let (left, right) = split_runs(&text.content);
    let mut runs = vec![text_run(text, left, text.left_offset_x, text.left_offset_y)];
    if !right.is_empty() {
        runs.push(text_run(
            text,
            right,
            text.right_offset_x,
            text.right_offset_y,
        ));
    }
    runs
}

fn container(icon: &IconElement, background: &IconBackground) -> Option<RenderNode> {
    let corner = match background.shape {
        BackgroundShape::None => return None,
        BackgroundShape::Circle => CornerRadius::Full,
        BackgroundShape::Square => CornerRadius::Px(0.0),
        BackgroundShape::RoundedSquare => CornerRadius::Px(background.radius_px),
    };
    Some(RenderNode::new(
        NodeKind::IconContainer {
            size: icon.size + background.padding_px * 2.0,
            fill: Rgba::from_hex(&background.color, background.opacity),
            blur_px: background.blur_px,
            corner,
        },
        NodeTransform::default(),
        Anchor::Center,
    ))
}

fn icon_children(icon: &IconElement) -> Vec<RenderNode> {
    let glyph = RenderNode::new(
        NodeKind::IconGlyph {
            source: icon.source.clone(),
            size: icon.size,
            color: icon.color.clone(),
            corner_radius: icon.custom_icon_radius,
            shadow: icon.shadow.enabled.then(|| icon.shadow.clone()),
        },
        NodeTransform::default(),
        Anchor::Center,
    );
    container(icon, &icon.background)
        .into_iter()
        .chain(std::iter::once(glyph))
        .collect()
}

fn ai_image_children(image: &AiImageElement) -> Vec<RenderNode> {
    vec![RenderNode::new(
        NodeKind::AiImage {
            url: image.image_url.clone(),
            scale: image.scale,
        },
        NodeTransform::default(),
        Anchor::Center,
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{IconPatch, TextPatch};

    fn element_refs(composition: &Composition) -> Vec<ElementRef> {
        composition
            .nodes
            .iter()
            .filter_map(|node| match node.kind {
                NodeKind::Element { element } => Some(element),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_layer_order() {
        let mut store = SceneStore::new();
        let image = store.add_ai_image("a.png");
        let composition = compose(&store);

        assert!(matches!(composition.nodes[0].kind, NodeKind::Background { .. }));
        let refs = element_refs(&composition);
        assert_eq!(refs.len(), 3);
        assert_eq!(refs[0], store.texts()[0].element_ref());
        assert_eq!(refs[1], store.icons()[0].element_ref());
        assert_eq!(refs[2], ElementRef::ai_image(image));
    }

    #[test]
    fn test_z_index_orders_within_collection() {
        let mut store = SceneStore::new();
        let first = store.texts()[0].id;
        let second = store.add_text();
        store.update_text(
            first,
            TextPatch {
                z_index: Some(5),
                ..TextPatch::default()
            },
        );

        let refs = element_refs(&compose(&store));
        assert_eq!(refs[0], ElementRef::text(second));
        assert_eq!(refs[1], ElementRef::text(first));
    }

    #[test]
    fn test_element_transform_and_selection() {
        let mut store = SceneStore::new();
        let id = store.texts()[0].id;
        store.update_text(
            id,
            TextPatch {
                x: Some(40.0),
                y: Some(-10.0),
                rotation: Some(30.0),
                ..TextPatch::default()
            },
        );
        store.select(Some(ElementRef::text(id)));

        let composition = compose(&store);
        let node = composition
            .nodes
            .iter()
            .find(|n| n.kind == NodeKind::Element { element: ElementRef::text(id) })
            .expect("text group");
        assert_eq!(node.anchor, Anchor::Center);
        assert!(node.selected);
        assert!((node.transform.translate_x - 40.0).abs() < f32::EPSILON);
        assert!((node.transform.rotation - 30.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_split_text_produces_two_runs() {
        let mut store = SceneStore::new();
        let id = store.texts()[0].id;
        store.update_text(
            id,
            TextPatch {
                is_split: Some(true),
                left_offset_x: Some(-60.0),
                right_offset_x: Some(60.0),
                ..TextPatch::default()
            },
        );

        let composition = compose(&store);
        let group = &composition.nodes[1];
        assert_eq!(group.children.len(), 2);
        match (&group.children[0].kind, &group.children[1].kind) {
            (NodeKind::TextRun { content: left, .. }, NodeKind::TextRun { content: right, .. }) => {
                assert_eq!(left, "封面");
                assert_eq!(right, "标题");
            }
            other => panic!("unexpected children {other:?}"),
        }
        assert!((group.children[0].transform.translate_x + 60.0).abs() < f32::EPSILON);
        assert!((group.children[1].transform.translate_x - 60.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_icon_container_shapes() {
        let mut store = SceneStore::new();
        let id = store.icons()[0].id;
        let mut background = store.icons()[0].background.clone();

        let corner_of = |store: &SceneStore| {
            compose(store)
                .nodes
                .iter()
                .flat_map(|node| node.children.iter())
                .find_map(|child| match child.kind {
                    NodeKind::IconContainer { corner, .. } => Some(corner),
                    _ => None,
                })
        };

        assert_eq!(corner_of(&store), Some(CornerRadius::Px(40.0)));

        for (shape, expected) in [
            (BackgroundShape::Circle, Some(CornerRadius::Full)),
            (BackgroundShape::Square, Some(CornerRadius::Px(0.0))),
            (BackgroundShape::None, None),
        ] {
            background.shape = shape;
            store.update_icon(
                id,
                IconPatch {
                    background: Some(background.clone()),
                    ..IconPatch::default()
                },
            );
            assert_eq!(corner_of(&store), expected, "shape {shape:?}");
        }
    }

    #[test]
    fn test_container_opacity_not_on_glyph() {
        let mut store = SceneStore::new();
        let id = store.icons()[0].id;
        let mut background = store.icons()[0].background.clone();
        background.opacity = 0.4;
        store.update_icon(
            id,
            IconPatch {
                background: Some(background),
                ..IconPatch::default()
            },
        );

        let composition = compose(&store);
        let group = composition
            .nodes
            .iter()
            .find(|n| n.kind == NodeKind::Element { element: ElementRef::icon(id) })
            .expect("icon group");
        match &group.children[0].kind {
            NodeKind::IconContainer { fill, size, .. } => {
                assert!((fill.a - 0.4).abs() < f32::EPSILON);
                assert!((size - 200.0).abs() < f32::EPSILON);
            }
            other => panic!("expected container, got {other:?}"),
        }
        assert!(matches!(group.children[1].kind, NodeKind::IconGlyph { .. }));
    }

    #[test]
    fn test_overlays_excluded_from_export() {
        let mut store = SceneStore::new();
        store.toggle_ratio(AspectRatio::Portrait);

        let composition = compose(&store);
        let overlays = composition.nodes.iter().filter(|n| n.export_excluded).count();
        // Two ratio frames and the ruler.
        assert_eq!(overlays, 3);

        let exported = composition.exportable();
        assert!(exported.nodes.iter().all(|n| !n.export_excluded));
        assert_eq!(exported.nodes.len(), composition.nodes.len() - 3);
        assert_eq!(exported.node_count(), composition.node_count() - 3);
    }

    #[test]
    fn test_ratio_frame_origin() {
        let mut store = SceneStore::new();
        store.toggle_ratio(AspectRatio::Portrait);
        let composition = compose(&store);

        let frame = composition
            .nodes
            .iter()
            .find(|n| {
                matches!(
                    n.kind,
                    NodeKind::RatioFrame {
                        ratio: AspectRatio::Portrait,
                        ..
                    }
                )
            })
            .expect("portrait frame");
        assert!((frame.transform.translate_x - 350.0).abs() < f32::EPSILON);
        assert!(frame.transform.translate_y.abs() < f32::EPSILON);
    }

    #[test]
    fn test_ruler_hidden() {
        let mut store = SceneStore::new();
        store.set_show_ruler(false);
        let composition = compose(&store);
        assert!(!composition
            .nodes
            .iter()
            .any(|n| matches!(n.kind, NodeKind::Ruler { .. })));
    }

    #[test]
    fn test_json_tags() {
        let json = compose(&SceneStore::new()).to_json().expect("serialize");
        assert!(json.contains("\"type\":\"background\""));
        assert!(json.contains("\"exportExcluded\":true"));
    }
}
