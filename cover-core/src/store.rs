//! Authoritative scene state.
//!
//! [`SceneStore`] owns every element collection, the background, the active
//! output ratios and the selection. It is constructed explicitly and handed to
//! the interaction controller and the composer by reference; there is no
//! process-wide instance.
//!
//! Mutations never fail. A request that would break an invariant (removing
//! the last text or icon, toggling off the last ratio, touching an unknown
//! element) is refused: the store is left untouched and the call reports
//! `false`/`None`.

use tracing::debug;

use crate::background::{Background, BackgroundPatch, BackgroundTransform, FitMode};
use crate::element::{
    AiImageElement, AiImagePatch, ElementId, ElementRef, ElementType, ElementView, IconElement,
    IconPatch, Placed, TextElement, TextPatch,
};
use crate::geometry::{self, AspectRatio, Point, Size, COVER_SEAM_BUFFER};

/// Position delta applied to duplicates so they don't sit exactly on the original.
pub const DUPLICATE_OFFSET: f32 = 20.0;

/// Content of the text element every new store starts with.
pub const DEFAULT_TITLE: &str = "封面标题";

/// Content of texts created by [`SceneStore::add_text`].
pub const NEW_TEXT_CONTENT: &str = "新文字";

/// Icon name used for seeded and added icons.
pub const DEFAULT_ICON: &str = "logos:react";

/// Ratio active in a new store.
pub const DEFAULT_RATIO: AspectRatio = AspectRatio::Widescreen;

/// Single source of truth for the cover being composed.
///
/// # Example
///
/// ```
/// use cover_core::{ElementRef, SceneStore};
///
/// let mut store = SceneStore::new();
/// let id = store.add_text();
///
/// assert_eq!(store.selection(), Some(ElementRef::text(id)));
/// assert_eq!(store.texts().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct SceneStore {
    texts: Vec<TextElement>,
    icons: Vec<IconElement>,
    ai_images: Vec<AiImageElement>,
    background: Background,
    active_ratios: Vec<AspectRatio>,
    show_ruler: bool,
    selection: Option<ElementRef>,
    revision: u64,
}

impl Default for SceneStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneStore {
    /// Create the initial scene: one title text, one icon, no AI images,
    /// a solid background and the 16:9 ratio.
    #[must_use]
    pub fn new() -> Self {
        Self {
            texts: vec![TextElement::new(DEFAULT_TITLE)],
            icons: vec![IconElement::new(DEFAULT_ICON)],
            ai_images: Vec::new(),
            background: Background::default(),
            active_ratios: vec![DEFAULT_RATIO],
            show_ruler: true,
            selection: None,
            revision: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// All text elements.
    #[must_use]
    pub fn texts(&self) -> &[TextElement] {
        &self.texts
    }

    /// All icon elements.
    #[must_use]
    pub fn icons(&self) -> &[IconElement] {
        &self.icons
    }

    /// All AI image elements.
    #[must_use]
    pub fn ai_images(&self) -> &[AiImageElement] {
        &self.ai_images
    }

    /// The background descriptor.
    #[must_use]
    pub fn background(&self) -> &Background {
        &self.background
    }

    /// Active output ratios, never empty.
    #[must_use]
    pub fn active_ratios(&self) -> &[AspectRatio] {
        &self.active_ratios
    }

    /// Whether the ruler overlay is shown.
    #[must_use]
    pub fn show_ruler(&self) -> bool {
        self.show_ruler
    }

    /// Current selection.
    #[must_use]
    pub fn selection(&self) -> Option<ElementRef> {
        self.selection
    }

    /// Counter bumped by every effective mutation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Bounding canvas of the active ratios.
    #[must_use]
    pub fn canvas_size(&self) -> Size {
        geometry::canvas_bounds(&self.active_ratios)
    }

    /// Look up a text element.
    #[must_use]
    pub fn text(&self, id: ElementId) -> Option<&TextElement> {
        find(&self.texts, id)
    }

    /// Look up an icon element.
    #[must_use]
    pub fn icon(&self, id: ElementId) -> Option<&IconElement> {
        find(&self.icons, id)
    }

    /// Look up an AI image element.
    #[must_use]
    pub fn ai_image(&self, id: ElementId) -> Option<&AiImageElement> {
        find(&self.ai_images, id)
    }

    /// Resolve a reference to whichever collection it points into.
    #[must_use]
    pub fn element(&self, target: ElementRef) -> Option<ElementView<'_>> {
        match target.kind {
            ElementType::Text => self.text(target.id).map(ElementView::Text),
            ElementType::Icon => self.icon(target.id).map(ElementView::Icon),
            ElementType::AiImage => self.ai_image(target.id).map(ElementView::AiImage),
        }
    }

    /// Whether `target` references an existing element.
    #[must_use]
    pub fn contains(&self, target: ElementRef) -> bool {
        self.element(target).is_some()
    }

    /// The selected element, resolved.
    #[must_use]
    pub fn selected_element(&self) -> Option<ElementView<'_>> {
        self.selection.and_then(|target| self.element(target))
    }

    // -----------------------------------------------------------------------
    // Ratios and overlays
    // -----------------------------------------------------------------------

    /// Flip membership of `ratio` in the active set.
    ///
    /// Turning off the only active ratio is refused. Returns whether the set changed.
    pub fn toggle_ratio(&mut self, ratio: AspectRatio) -> bool {
        if let Some(idx) = self.active_ratios.iter().position(|r| *r == ratio) {
            if self.active_ratios.len() == 1 {
                debug!("Refusing to deactivate last ratio {ratio}");
                return false;
            }
            self.active_ratios.remove(idx);
        } else {
            self.active_ratios.push(ratio);
        }
        self.bump();
        true
    }

    /// Show or hide the ruler overlay.
    pub fn set_show_ruler(&mut self, show: bool) {
        if self.show_ruler != show {
            self.show_ruler = show;
            self.bump();
        }
    }

    // -----------------------------------------------------------------------
    // Texts
    // -----------------------------------------------------------------------

    /// Add a default text element and select it.
    pub fn add_text(&mut self) -> ElementId {
        let text = TextElement::new(NEW_TEXT_CONTENT);
        let target = text.element_ref();
        self.texts.push(text);
        self.select_new(target)
    }

    /// Remove a text element. The last remaining text cannot be removed.
    pub fn remove_text(&mut self, id: ElementId) -> bool {
        self.remove(ElementRef::text(id))
    }

    /// Shallow-merge `patch` into a text element. Unknown ids are ignored.
    pub fn update_text(&mut self, id: ElementId, patch: TextPatch) -> bool {
        self.modify(ElementRef::text(id), |store| {
            find_mut(&mut store.texts, id).map(|text| patch.apply(text))
        })
    }

    /// Copy a text element with an offset position and select the copy.
    pub fn duplicate_text(&mut self, id: ElementId) -> Option<ElementId> {
        self.duplicate(ElementRef::text(id)).map(|r| r.id)
    }

    // -----------------------------------------------------------------------
    // Icons
    // -----------------------------------------------------------------------

    /// Add a default icon element and select it.
    pub fn add_icon(&mut self) -> ElementId {
        let icon = IconElement::new(DEFAULT_ICON);
        let target = icon.element_ref();
        self.icons.push(icon);
        self.select_new(target)
    }

    /// Remove an icon element. The last remaining icon cannot be removed.
    pub fn remove_icon(&mut self, id: ElementId) -> bool {
        self.remove(ElementRef::icon(id))
    }

    /// Shallow-merge `patch` into an icon element. Unknown ids are ignored.
    pub fn update_icon(&mut self, id: ElementId, patch: IconPatch) -> bool {
        self.modify(ElementRef::icon(id), |store| {
            find_mut(&mut store.icons, id).map(|icon| patch.apply(icon))
        })
    }

    /// Copy an icon element with an offset position and select the copy.
    pub fn duplicate_icon(&mut self, id: ElementId) -> Option<ElementId> {
        self.duplicate(ElementRef::icon(id)).map(|r| r.id)
    }

    // -----------------------------------------------------------------------
    // AI images
    // -----------------------------------------------------------------------

    /// Place a generated image at the canvas center and select it.
    pub fn add_ai_image(&mut self, image_url: impl Into<String>) -> ElementId {
        let image = AiImageElement::new(image_url);
        let target = image.element_ref();
        self.ai_images.push(image);
        self.select_new(target)
    }

    /// Remove an AI image element.
    pub fn remove_ai_image(&mut self, id: ElementId) -> bool {
        self.remove(ElementRef::ai_image(id))
    }

    /// Shallow-merge `patch` into an AI image element. Unknown ids are ignored.
    pub fn update_ai_image(&mut self, id: ElementId, patch: AiImagePatch) -> bool {
        self.modify(ElementRef::ai_image(id), |store| {
            find_mut(&mut store.ai_images, id).map(|image| patch.apply(image))
        })
    }

    /// Copy an AI image element with an offset position and select the copy.
    pub fn duplicate_ai_image(&mut self, id: ElementId) -> Option<ElementId> {
        self.duplicate(ElementRef::ai_image(id)).map(|r| r.id)
    }

    // -----------------------------------------------------------------------
    // Any element
    // -----------------------------------------------------------------------

    /// Move an element's centroid to `at` (scene units from canvas center).
    pub fn set_position(&mut self, target: ElementRef, at: Point) -> bool {
        let id = target.id;
        self.modify(target, |store| match target.kind {
            ElementType::Text => find_mut(&mut store.texts, id).map(|e| e.set_position(at)),
            ElementType::Icon => find_mut(&mut store.icons, id).map(|e| e.set_position(at)),
            ElementType::AiImage => find_mut(&mut store.ai_images, id).map(|e| e.set_position(at)),
        })
    }

    /// Remove any element, clearing the selection if it pointed there.
    ///
    /// Texts and icons keep at least one element; such removals are refused.
    pub fn remove(&mut self, target: ElementRef) -> bool {
        let removed = match target.kind {
            ElementType::Text => remove_from(&mut self.texts, target.id, 1),
            ElementType::Icon => remove_from(&mut self.icons, target.id, 1),
            ElementType::AiImage => remove_from(&mut self.ai_images, target.id, 0),
        };
        if !removed {
            debug!("Refusing to remove {} {}", target.kind, target.id);
            return false;
        }
        if self.selection == Some(target) {
            self.selection = None;
        }
        self.bump();
        true
    }

    /// Duplicate any element. The copy gets a fresh id, an offset position
    /// and becomes the selection.
    pub fn duplicate(&mut self, target: ElementRef) -> Option<ElementRef> {
        let id = match target.kind {
            ElementType::Text => duplicate_in(&mut self.texts, target.id),
            ElementType::Icon => duplicate_in(&mut self.icons, target.id),
            ElementType::AiImage => duplicate_in(&mut self.ai_images, target.id),
        };
        let Some(id) = id else {
            debug!("Cannot duplicate missing {} {}", target.kind, target.id);
            return None;
        };
        let copy = ElementRef {
            kind: target.kind,
            id,
        };
        self.selection = Some(copy);
        self.bump();
        Some(copy)
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Select an element, or clear the selection with `None`.
    ///
    /// A reference to a missing element is ignored so the selection never
    /// dangles. Returns whether the selection now equals `target`.
    pub fn select(&mut self, target: Option<ElementRef>) -> bool {
        if let Some(target) = target {
            if !self.contains(target) {
                debug!("Ignoring selection of missing {} {}", target.kind, target.id);
                return false;
            }
        }
        if self.selection != target {
            self.selection = target;
            self.bump();
        }
        true
    }

    /// Clear the selection without counting it as a scene mutation.
    pub(crate) fn take_selection(&mut self) -> Option<ElementRef> {
        self.selection.take()
    }

    /// Put back a selection taken with [`Self::take_selection`].
    pub(crate) fn restore_selection(&mut self, previous: Option<ElementRef>) {
        self.selection = previous.filter(|target| self.contains(*target));
    }

    // -----------------------------------------------------------------------
    // Background
    // -----------------------------------------------------------------------

    /// Shallow-merge `patch` into the background.
    pub fn update_background(&mut self, patch: BackgroundPatch) {
        patch.apply(&mut self.background);
        self.bump();
    }

    /// Reset the background placement for `mode`.
    ///
    /// Position and rotation always reset. `Contain` uses scale 1. `Cover`
    /// computes the cover scale (plus a seam buffer) from `image_size`, which
    /// the caller measured from the current background image; without an image
    /// background or without a usable size it falls back to scale 1.
    pub fn fit_background(&mut self, mode: FitMode, image_size: Option<Size>) {
        let canvas_aspect = self.canvas_size().aspect();
        let scale = match mode {
            FitMode::Contain => 1.0,
            FitMode::Cover => {
                let image_aspect = image_size
                    .filter(|_| self.background.active_image().is_some())
                    .and_then(Size::aspect);
                match (image_aspect, canvas_aspect) {
                    (Some(image), Some(canvas)) => {
                        geometry::cover_scale(image, canvas) * COVER_SEAM_BUFFER
                    }
                    _ => {
                        debug!("Cover fit without a measurable background image, using scale 1");
                        1.0
                    }
                }
            }
        };
        self.background.transform = BackgroundTransform {
            scale,
            ..BackgroundTransform::default()
        };
        self.bump();
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    fn select_new(&mut self, target: ElementRef) -> ElementId {
        self.selection = Some(target);
        self.bump();
        target.id
    }

    fn modify(&mut self, target: ElementRef, f: impl FnOnce(&mut Self) -> Option<()>) -> bool {
        if f(self).is_some() {
            self.bump();
            true
        } else {
            debug!("Ignoring update of missing {} {}", target.kind, target.id);
            false
        }
    }
}

fn find<T: Placed>(items: &[T], id: ElementId) -> Option<&T> {
    items.iter().find(|item| item.id() == id)
}

fn find_mut<T: Placed>(items: &mut [T], id: ElementId) -> Option<&mut T> {
    items.iter_mut().find(|item| item.id() == id)
}

/// Remove `id` unless fewer than `keep` elements would remain.
fn remove_from<T: Placed>(items: &mut Vec<T>, id: ElementId, keep: usize) -> bool {
    match items.iter().position(|item| item.id() == id) {
        Some(idx) if items.len() > keep => {
            items.remove(idx);
            true
        }
        _ => false,
    }
}

fn duplicate_in<T: Placed>(items: &mut Vec<T>, id: ElementId) -> Option<ElementId> {
    let mut copy = find(items, id)?.clone();
    let origin = copy.position();
    copy.set_id(ElementId::new());
    copy.set_position(Point::new(
        origin.x + DUPLICATE_OFFSET,
        origin.y + DUPLICATE_OFFSET,
    ));
    let new_id = copy.id();
    items.push(copy);
    Some(new_id)
}
