//! # Cover Canvas Renderer
//!
//! Raster snapshot renderer for cover compositions.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐    ┌─────────────┐    ┌──────────────┐
//! │ Composition  │ ─▶ │ SVG string  │ ─▶ │ resvg / PNG  │
//! │ (cover-core) │    │ (svg.rs)    │    │ (tiny-skia)  │
//! └──────────────┘    └─────────────┘    └──────────────┘
//! ```
//!
//! Image sources (`data:` URIs and local paths) are inlined before
//! rasterization; [`probe_dimensions`] exposes the same loader for cover fits.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod image;
pub mod svg;

pub use error::{RenderError, RenderResult};
pub use image::{probe_dimensions, ImageFormat};
pub use svg::{render_svg, SvgSnapshotRenderer};

/// Renderer version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
