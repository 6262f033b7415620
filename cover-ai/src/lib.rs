//! # Cover Canvas AI
//!
//! Image generation for cover compositions.
//!
//! ```text
//! ┌──────────────┐  submit   ┌───────────────────┐  HTTP  ┌──────────────┐
//! │ Generation   │ ────────▶ │ dyn ImageGenerator│ ─────▶ │ Gemini /     │
//! │ Session      │ ◀──────── │ (tokio task)      │ ◀───── │ OpenAI       │
//! └──────┬───────┘  mpsc     └───────────────────┘        └──────────────┘
//!        │ apply_to_background / place_on_canvas
//!        ▼
//!   SceneStore (cover-core)
//! ```
//!
//! Provider settings live in an [`AiConfig`] persisted through a
//! [`ConfigStore`] as a versioned document.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod gemini;
pub mod openai;
pub mod placement;
pub mod provider;
pub mod request;
pub mod session;

pub use config::{
    load_config, migrate, save_config, AiConfig, ConfigStore, FileConfigStore, MemoryConfigStore,
    Provider, ProviderConfig, CONFIG_KEY, CONFIG_VERSION,
};
pub use error::{ConfigError, ConfigResult, GenerationError, GenerationResult};
pub use gemini::GeminiClient;
pub use openai::{size_for_aspect_ratio, OpenAiClient};
pub use placement::{apply_to_background, place_on_canvas};
pub use provider::ImageGenerator;
pub use request::{GenerationMode, GenerationOptions, GenerationRequest};
pub use session::{Completion, GenerationSession, RequestId, MAX_GENERATED_IMAGES};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
