//! Composition export to PNG.
//!
//! Renders a [`Composition`] to an SVG document and rasterizes it with the
//! resvg/tiny-skia pipeline. Element groups are placed relative to the canvas
//! center; everything else is placed from the top-left corner.

use std::fmt::Write;
use std::sync::Arc;

use cover_core::compose::{Anchor, BackgroundFill, CornerRadius, NodeTransform};
use cover_core::{
    CanvasResult, Composition, IconSource, NodeKind, RenderNode, Shadow, Size, SnapshotOptions,
    SnapshotRenderer,
};
use tracing::{debug, warn};

use crate::error::{RenderError, RenderResult};
use crate::image::inline_source;

/// Longest edge, in scene units, of an AI image at scale 1.
pub const AI_IMAGE_BASE_EDGE: f32 = 400.0;

/// Fill drawn behind image backgrounds.
const IMAGE_BACKDROP: &str = "#ffffff";

/// Renders compositions to PNG through an SVG intermediate.
#[derive(Debug, Clone)]
pub struct SvgSnapshotRenderer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl Default for SvgSnapshotRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl SvgSnapshotRenderer {
    /// Create a renderer. With the `system-fonts` feature installed fonts are
    /// loaded so text runs rasterize.
    #[must_use]
    pub fn new() -> Self {
        #[allow(unused_mut)]
        let mut db = usvg::fontdb::Database::new();
        #[cfg(feature = "system-fonts")]
        {
            db.load_system_fonts();
            debug!("Loaded {} font faces", db.len());
        }
        Self {
            fontdb: Arc::new(db),
        }
    }

    /// Create a renderer with an empty font database. Text is skipped.
    #[must_use]
    pub fn without_fonts() -> Self {
        Self {
            fontdb: Arc::new(usvg::fontdb::Database::new()),
        }
    }

    /// Render `composition` to PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if rasterization or encoding fails.
    pub fn render_png(&self, composition: &Composition, pixel_ratio: f32) -> RenderResult<Vec<u8>> {
        let svg = render_svg(composition, pixel_ratio);
        let pixmap = self.rasterize_svg(&svg)?;
        pixmap
            .encode_png()
            .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))
    }

    /// Rasterize an SVG string to a tiny-skia Pixmap.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn rasterize_svg(&self, svg: &str) -> RenderResult<tiny_skia::Pixmap> {
        let opt = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_str(svg, &opt)
            .map_err(|e| RenderError::Export(format!("SVG parsing failed: {e}")))?;

        let px_w = tree.size().width().ceil() as u32;
        let px_h = tree.size().height().ceil() as u32;

        let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
            .ok_or_else(|| RenderError::Export("Failed to create pixmap".to_string()))?;

        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        Ok(pixmap)
    }
}

impl SnapshotRenderer for SvgSnapshotRenderer {
    fn render(&self, composition: &Composition, options: &SnapshotOptions) -> CanvasResult<Vec<u8>> {
        Ok(self.render_png(composition, options.pixel_ratio)?)
    }
}

/// Render `composition` to an SVG document.
///
/// The view box is the canvas in scene units; the pixel size is the canvas
/// multiplied by `pixel_ratio`. Unloadable images are skipped with a warning.
#[must_use]
pub fn render_svg(composition: &Composition, pixel_ratio: f32) -> String {
    let canvas = composition.canvas;
    let ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
        pixel_ratio
    } else {
        1.0
    };
    let mut writer = SvgWriter::new(canvas);
    for node in &composition.nodes {
        writer.node(node, true);
    }

    let mut svg = String::with_capacity(writer.body.len() + writer.defs.len() + 256);
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\">",
        canvas.width * ratio,
        canvas.height * ratio,
        canvas.width,
        canvas.height,
    );
    if !writer.defs.is_empty() {
        let _ = write!(svg, "<defs>{}</defs>", writer.defs);
    }
    svg.push_str(&writer.body);
    svg.push_str("</svg>");
    svg
}

struct SvgWriter {
    canvas: Size,
    defs: String,
    body: String,
    next_id: u32,
}

impl SvgWriter {
    fn new(canvas: Size) -> Self {
        Self {
            canvas,
            defs: String::new(),
            body: String::with_capacity(4096),
            next_id: 0,
        }
    }

    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn blur_filter(&mut self, std_deviation: f32) -> String {
        let id = self.id("blur");
        let _ = write!(
            self.defs,
            "<filter id=\"{id}\" x=\"-50%\" y=\"-50%\" width=\"200%\" height=\"200%\"><feGaussianBlur stdDeviation=\"{std_deviation}\"/></filter>",
        );
        id
    }

    fn shadow_filter(&mut self, shadow: &Shadow) -> String {
        let id = self.id("shadow");
        let _ = write!(
            self.defs,
            "<filter id=\"{id}\" x=\"-50%\" y=\"-50%\" width=\"200%\" height=\"200%\"><feDropShadow dx=\"0\" dy=\"{}\" stdDeviation=\"{}\" flood-color=\"{}\"/></filter>",
            shadow.offset_y,
            shadow.blur / 2.0,
            escape_xml(&shadow.color),
        );
        id
    }

    fn rect_clip(&mut self, x: f32, y: f32, width: f32, height: f32, radius: f32) -> String {
        let id = self.id("clip");
        let _ = write!(
            self.defs,
            "<clipPath id=\"{id}\"><rect x=\"{x}\" y=\"{y}\" width=\"{width}\" height=\"{height}\" rx=\"{radius}\"/></clipPath>",
        );
        id
    }

    fn open_group(&mut self, transform: &NodeTransform, anchor: Anchor, top_level: bool) {
        let (mut x, mut y) = (transform.translate_x, transform.translate_y);
        if anchor == Anchor::Center && top_level {
            x += self.canvas.width / 2.0;
            y += self.canvas.height / 2.0;
        }
        let _ = write!(
            self.body,
            "<g transform=\"translate({x},{y}) rotate({})\">",
            transform.rotation
        );
    }

    fn node(&mut self, node: &RenderNode, top_level: bool) {
        self.open_group(&node.transform, node.anchor, top_level);
        match &node.kind {
            NodeKind::Background {
                fill,
                blur_px,
                radius_px,
                opacity,
            } => self.background(fill, *blur_px, *radius_px, *opacity),
            NodeKind::InnerShadow {
                color,
                blur,
                offset_y,
            } => self.inner_shadow(color, *blur, *offset_y),
            NodeKind::Element { .. } => {}
            NodeKind::TextRun {
                content,
                font_size,
                font_weight,
                font,
                color,
                stroke_color,
                stroke_width,
            } => {
                let _ = write!(
                    self.body,
                    "<text x=\"0\" y=\"0\" text-anchor=\"middle\" dominant-baseline=\"central\" font-size=\"{font_size}\" font-weight=\"{font_weight}\" font-family=\"{}\" fill=\"{}\"",
                    escape_xml(font),
                    escape_xml(color),
                );
                if *stroke_width > 0.0 {
                    let _ = write!(
                        self.body,
                        " stroke=\"{}\" stroke-width=\"{stroke_width}\" paint-order=\"stroke\"",
                        escape_xml(stroke_color),
                    );
                }
                let _ = write!(self.body, ">{}</text>", escape_xml(content));
            }
            NodeKind::IconContainer {
                size,
                fill,
                corner,
                ..
            } => {
                // Backdrop blur has no SVG equivalent; only the fill is drawn.
                let radius = match corner {
                    CornerRadius::Full => size / 2.0,
                    CornerRadius::Px(r) => *r,
                };
                let half = size / 2.0;
                let _ = write!(
                    self.body,
                    "<rect x=\"{}\" y=\"{}\" width=\"{size}\" height=\"{size}\" rx=\"{radius}\" fill=\"rgb({},{},{})\" fill-opacity=\"{}\"/>",
                    -half, -half, fill.r, fill.g, fill.b, fill.a,
                );
            }
            NodeKind::IconGlyph {
                source,
                size,
                color,
                corner_radius,
                shadow,
            } => self.icon_glyph(source, *size, color, *corner_radius, shadow.as_ref()),
            NodeKind::AiImage { url, scale } => self.ai_image(url, *scale),
            NodeKind::RatioFrame { size, .. } => {
                let _ = write!(
                    self.body,
                    "<rect width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"#3b82f6\" stroke-width=\"2\" stroke-dasharray=\"8 6\"/>",
                    size.width, size.height,
                );
            }
            NodeKind::Ruler { spacing } => self.ruler(*spacing),
        }
        for child in &node.children {
            self.node(child, false);
        }
        self.body.push_str("</g>");
    }

    fn background(&mut self, fill: &BackgroundFill, blur_px: f32, radius_px: f32, opacity: f32) {
        let Size { width, height } = self.canvas;
        let clip = self.rect_clip(0.0, 0.0, width, height, radius_px);
        let _ = write!(
            self.body,
            "<g clip-path=\"url(#{clip})\" opacity=\"{opacity}\">"
        );
        match fill {
            BackgroundFill::Solid { color } => {
                let _ = write!(
                    self.body,
                    "<rect width=\"{width}\" height=\"{height}\" fill=\"{}\"/>",
                    escape_xml(color),
                );
            }
            BackgroundFill::Image { url, transform } => {
                let _ = write!(
                    self.body,
                    "<rect width=\"{width}\" height=\"{height}\" fill=\"{IMAGE_BACKDROP}\"/>",
                );
                match inline_source(url) {
                    Ok(image) => {
                        let (cx, cy) = (width / 2.0, height / 2.0);
                        let dx = (transform.position_x - 50.0) / 100.0 * width;
                        let dy = (transform.position_y - 50.0) / 100.0 * height;
                        let filter = if blur_px > 0.0 {
                            format!(" filter=\"url(#{})\"", self.blur_filter(blur_px))
                        } else {
                            String::new()
                        };
                        let _ = write!(
                            self.body,
                            "<g transform=\"translate({cx},{cy}) scale({}) translate({dx},{dy}) rotate({}) translate({},{})\"{filter}><image width=\"{width}\" height=\"{height}\" preserveAspectRatio=\"xMidYMid meet\" href=\"{}\"/></g>",
                            transform.scale,
                            transform.rotation,
                            -cx,
                            -cy,
                            escape_xml(&image.href),
                        );
                    }
                    Err(e) => warn!("Skipping background image: {e}"),
                }
            }
        }
        self.body.push_str("</g>");
    }

    fn inner_shadow(&mut self, color: &str, blur: f32, offset_y: f32) {
        let Size { width, height } = self.canvas;
        let clip = self.rect_clip(0.0, 0.0, width, height, 0.0);
        let filter = self.blur_filter((blur / 2.0).max(0.1));
        let spread = blur.max(1.0);
        let _ = write!(
            self.body,
            "<g clip-path=\"url(#{clip})\"><rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\" filter=\"url(#{filter})\"/></g>",
            -spread,
            offset_y - spread,
            width + spread * 2.0,
            height + spread * 2.0,
            escape_xml(color),
            spread * 2.0,
        );
    }

    fn icon_glyph(
        &mut self,
        source: &IconSource,
        size: f32,
        color: &str,
        corner_radius: f32,
        shadow: Option<&Shadow>,
    ) {
        let filter = shadow
            .map(|s| format!(" filter=\"url(#{})\"", self.shadow_filter(s)))
            .unwrap_or_default();
        let _ = write!(self.body, "<g{filter}>");
        match source {
            IconSource::Named(name) => {
                // Icon sets are resolved by the host; draw a tinted badge with the initial.
                let half = size / 2.0;
                let initial: String = name
                    .rsplit(':')
                    .next()
                    .and_then(|n| n.chars().next())
                    .map(|c| c.to_uppercase().collect())
                    .unwrap_or_default();
                let _ = write!(
                    self.body,
                    "<rect x=\"{}\" y=\"{}\" width=\"{size}\" height=\"{size}\" rx=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"/>",
                    -half,
                    -half,
                    size / 5.0,
                    escape_xml(color),
                    size / 12.0,
                );
                let _ = write!(
                    self.body,
                    "<text x=\"0\" y=\"0\" text-anchor=\"middle\" dominant-baseline=\"central\" font-size=\"{}\" font-family=\"sans-serif\" fill=\"{}\">{}</text>",
                    size / 2.0,
                    escape_xml(color),
                    escape_xml(&initial),
                );
            }
            IconSource::Custom(url) => match inline_source(url) {
                Ok(image) => {
                    let width = image
                        .size
                        .and_then(Size::aspect)
                        .map_or(size, |aspect| size * aspect);
                    let (x, y) = (-width / 2.0, -size / 2.0);
                    let clip = self.rect_clip(x, y, width, size, corner_radius);
                    let _ = write!(
                        self.body,
                        "<image x=\"{x}\" y=\"{y}\" width=\"{width}\" height=\"{size}\" clip-path=\"url(#{clip})\" href=\"{}\"/>",
                        escape_xml(&image.href),
                    );
                }
                Err(e) => warn!("Skipping custom icon: {e}"),
            },
        }
        self.body.push_str("</g>");
    }

    fn ai_image(&mut self, url: &str, scale: f32) {
        match inline_source(url) {
            Ok(image) => {
                let aspect = image.size.and_then(Size::aspect).unwrap_or(1.0);
                let (w, h) = if aspect >= 1.0 {
                    (AI_IMAGE_BASE_EDGE, AI_IMAGE_BASE_EDGE / aspect)
                } else {
                    (AI_IMAGE_BASE_EDGE * aspect, AI_IMAGE_BASE_EDGE)
                };
                let (w, h) = (w * scale, h * scale);
                let _ = write!(
                    self.body,
                    "<image x=\"{}\" y=\"{}\" width=\"{w}\" height=\"{h}\" href=\"{}\"/>",
                    -w / 2.0,
                    -h / 2.0,
                    escape_xml(&image.href),
                );
            }
            Err(e) => warn!("Skipping AI image: {e}"),
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    fn ruler(&mut self, spacing: f32) {
        if spacing <= 0.0 {
            return;
        }
        let Size { width, height } = self.canvas;
        self.body
            .push_str("<g stroke=\"#94a3b8\" stroke-opacity=\"0.4\" stroke-width=\"1\">");
        for i in 1..=(width / spacing) as u32 {
            let x = i as f32 * spacing;
            let _ = write!(self.body, "<line x1=\"{x}\" y1=\"0\" x2=\"{x}\" y2=\"{height}\"/>");
        }
        for i in 1..=(height / spacing) as u32 {
            let y = i as f32 * spacing;
            let _ = write!(self.body, "<line x1=\"0\" y1=\"{y}\" x2=\"{width}\" y2=\"{y}\"/>");
        }
        self.body.push_str("</g>");
    }
}

/// Escape special XML characters.
fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cover_core::{compose, BackgroundPatch, SceneStore, TextPatch};

    #[test]
    fn test_svg_uses_canvas_view_box() {
        let store = SceneStore::new();
        let svg = render_svg(&compose(&store), 1.0);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("viewBox=\"0 0 1600 900\""));
        assert!(svg.contains("width=\"1600\""));
    }

    #[test]
    fn test_pixel_ratio_scales_output() {
        let store = SceneStore::new();
        let svg = render_svg(&compose(&store), 2.0);
        assert!(svg.contains("width=\"3200\""));
        assert!(svg.contains("viewBox=\"0 0 1600 900\""));
    }

    #[test]
    fn test_elements_offset_from_center() {
        let mut store = SceneStore::new();
        let id = store.texts()[0].id;
        store.update_text(id, TextPatch::position(100.0, -50.0));

        let svg = render_svg(&compose(&store), 1.0);
        assert!(svg.contains("translate(900,400) rotate(0)"));
    }

    #[test]
    fn test_xml_escaping() {
        let mut store = SceneStore::new();
        let id = store.texts()[0].id;
        store.update_text(
            id,
            TextPatch {
                content: Some("A < B & C".to_string()),
                ..TextPatch::default()
            },
        );
        let svg = render_svg(&compose(&store), 1.0);
        assert!(svg.contains("A &lt; B &amp; C"));
    }

    #[test]
    fn test_stroke_only_when_width_positive() {
        let mut store = SceneStore::new();
        let svg = render_svg(&compose(&store), 1.0);
        assert!(!svg.contains("paint-order"));

        let id = store.texts()[0].id;
        store.update_text(
            id,
            TextPatch {
                stroke_width: Some(4.0),
                ..TextPatch::default()
            },
        );
        let svg = render_svg(&compose(&store), 1.0);
        assert!(svg.contains("stroke-width=\"4\" paint-order=\"stroke\""));
    }

    #[test]
    fn test_exportable_drops_guides() {
        let store = SceneStore::new();
        let composition = compose(&store);
        assert!(render_svg(&composition, 1.0).contains("stroke-dasharray"));
        assert!(!render_svg(&composition.exportable(), 1.0).contains("stroke-dasharray"));
    }

    #[test]
    fn test_missing_background_image_is_skipped() {
        let mut store = SceneStore::new();
        store.update_background(BackgroundPatch::image("/nope/missing.png"));
        let svg = render_svg(&compose(&store), 1.0);
        assert!(svg.contains("fill=\"#ffffff\""));
        assert!(!svg.contains("<image"));
    }

    #[test]
    fn test_png_export_produces_valid_bytes() {
        let store = SceneStore::new();
        let renderer = SvgSnapshotRenderer::without_fonts();
        let png = renderer
            .render_png(&compose(&store).exportable(), 0.1)
            .expect("png export");

        // PNG magic bytes: \x89PNG
        assert!(png.len() > 8);
        assert_eq!(&png[0..4], &[137, 80, 78, 71]);
    }
}
