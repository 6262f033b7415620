//! # Cover Core
//!
//! Composition engine for layered cover images exported at several aspect
//! ratios at once.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 cover-core                  │
//! ├─────────────────────────────────────────────┤
//! │  Scene Store      │  Interaction            │
//! │  - Texts / icons  │  - Pointer events       │
//! │  - AI images      │  - Drag state machine   │
//! │  - Background     │                         │
//! ├─────────────────────────────────────────────┤
//! │  Geometry         │  Composition & Export   │
//! │  - Ratio catalog  │  - Render tree          │
//! │  - Fit scales     │  - Overlay exclusion    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The store is constructed explicitly and passed by reference; everything
//! runs on the caller's thread.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod background;
pub mod color;
pub mod compose;
pub mod element;
pub mod error;
pub mod event;
pub mod export;
pub mod geometry;
pub mod interaction;
pub mod split;
pub mod store;

pub use background::{Background, BackgroundKind, BackgroundPatch, BackgroundTransform, FitMode};
pub use color::Rgba;
pub use compose::{compose, Composition, NodeKind, RenderNode};
pub use element::{
    AiImageElement, AiImagePatch, BackgroundShape, ElementId, ElementRef, ElementType,
    ElementView, IconBackground, IconElement, IconPatch, IconSource, Placed, Shadow, TextElement,
    TextPatch,
};
pub use error::{CanvasError, CanvasResult};
pub use event::{PointerEvent, PointerPhase};
pub use export::{export_snapshot, Snapshot, SnapshotOptions, SnapshotRenderer, EXPORT_FILE_NAME};
pub use geometry::{AspectRatio, Point, Size};
pub use interaction::{Disposition, DragState, InteractionController, PointerCapture};
pub use split::{split_runs, SplitOffsets, SplitPreset, SPLIT_PRESETS};
pub use store::SceneStore;

/// Cover core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
