//! # Cover Canvas CLI
//!
//! Command-line host for Cover Canvas.
//!
//! ## Usage
//!
//! ```bash
//! cover render --ratio 16:9 --ratio 4:3 --title "Hello" --out cover.png
//! cover config set --provider gemini --api-key "$GEMINI_KEY"
//! cover generate --prompt "a lighthouse at dusk" --aspect-ratio 16:9
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `render` - builds a `SceneStore` from flags and exports it through the SVG renderer
//! - `generate` - runs a `GenerationSession` against the configured provider
//! - `settings` - shows and edits the persisted provider configuration

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

mod generate;
mod render;
mod settings;

pub use generate::{generate_images, read_source, GENERATED_PREFIX};
pub use render::{build_scene, render_cover};
pub use settings::{apply_settings, describe_config};

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use cover_ai::{FileConfigStore, GenerationMode, Provider};
use cover_core::{AspectRatio, FitMode, EXPORT_FILE_NAME};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,cover_core=debug,cover_ai=debug";

/// Command-line arguments for `cover`.
#[derive(Debug, Clone, Parser)]
#[command(name = "cover")]
#[command(about = "Compose layered cover images and export them as PNG")]
#[command(version)]
pub struct CliArgs {
    /// Directory holding persisted settings
    #[arg(long, global = true, env = "COVER_CONFIG_DIR", default_value = ".cover")]
    pub config_dir: PathBuf,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Compose a cover and export it as PNG
    Render(RenderArgs),
    /// Generate images with the configured provider
    Generate(GenerateArgs),
    /// Show or edit provider settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Background fit modes accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FitArg {
    /// Whole image visible
    Contain,
    /// Canvas fully covered
    Cover,
}

impl From<FitArg> for FitMode {
    fn from(arg: FitArg) -> Self {
        match arg {
            FitArg::Contain => Self::Contain,
            FitArg::Cover => Self::Cover,
        }
    }
}

/// Arguments for `cover render`.
#[derive(Debug, Clone, Default, Args)]
pub struct RenderArgs {
    /// Aspect ratio frame to include (repeatable, e.g. 16:9, 4:3, 1:1)
    #[arg(long = "ratio")]
    pub ratios: Vec<AspectRatio>,

    /// Title text
    #[arg(long)]
    pub title: Option<String>,

    /// Render the title as two independently offset halves
    #[arg(long)]
    pub split: bool,

    /// Icon name (e.g. logos:rust) or path to an image file
    #[arg(long)]
    pub icon: Option<String>,

    /// Solid background colour
    #[arg(long)]
    pub background_color: Option<String>,

    /// Background image file
    #[arg(long)]
    pub background_image: Option<PathBuf>,

    /// How to fit the background image
    #[arg(long, value_enum, requires = "background_image")]
    pub fit: Option<FitArg>,

    /// Hide the alignment ruler
    #[arg(long)]
    pub no_ruler: bool,

    /// Output file
    #[arg(long, default_value = EXPORT_FILE_NAME)]
    pub out: PathBuf,
}

/// Generation modes accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ModeArg {
    /// Text to image
    #[default]
    Create,
    /// Edit the --source image
    Edit,
}

impl From<ModeArg> for GenerationMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Create => Self::Create,
            ModeArg::Edit => Self::Edit,
        }
    }
}

/// Arguments for `cover generate`.
#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// What to generate
    #[arg(long)]
    pub prompt: String,

    /// Create a new image or edit --source
    #[arg(long, value_enum, default_value_t = ModeArg::Create)]
    pub mode: ModeArg,

    /// Source image file for edit mode
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Aspect ratio passed to the provider (defaults to the configured one)
    #[arg(long)]
    pub aspect_ratio: Option<String>,

    /// Directory for generated files
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
}

/// `cover config` subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum ConfigCommand {
    /// Print the current settings with the API key masked
    Show,
    /// Update settings
    Set(SetArgs),
}

/// Arguments for `cover config set`.
#[derive(Debug, Clone, Default, Args)]
pub struct SetArgs {
    /// Provider to edit and make active
    #[arg(long, env = "COVER_PROVIDER")]
    pub provider: Option<Provider>,

    /// API base URL
    #[arg(long, env = "COVER_ENDPOINT")]
    pub endpoint: Option<String>,

    /// API key
    #[arg(long, env = "COVER_API_KEY")]
    pub api_key: Option<String>,

    /// Model name
    #[arg(long, env = "COVER_MODEL")]
    pub model: Option<String>,

    /// Default aspect ratio for generation
    #[arg(long)]
    pub aspect_ratio: Option<String>,

    /// Default size tier (1K, 2K, 4K)
    #[arg(long)]
    pub image_size: Option<String>,

    /// Ground prompts with web search (Gemini create mode)
    #[arg(long)]
    pub web_search: Option<bool>,
}

/// Install the global tracing subscriber.
///
/// Logs go to stderr; `RUST_LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("RUST_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Run a parsed command line.
///
/// # Errors
///
/// Returns an error if the command fails; the message is meant for the user.
pub fn run(args: CliArgs) -> anyhow::Result<()> {
    let store = FileConfigStore::new(&args.config_dir);
    match args.command {
        Command::Render(render) => {
            let path = render_cover(&render)?;
            println!("{}", path.display());
        }
        Command::Generate(generate) => {
            let config = cover_ai::load_config(&store)?;
            let runtime = tokio::runtime::Runtime::new()?;
            let paths = runtime.block_on(generate_images(&config, &generate))?;
            for path in paths {
                println!("{}", path.display());
            }
        }
        Command::Config(ConfigCommand::Show) => {
            let config = cover_ai::load_config(&store)?;
            print!("{}", describe_config(&config));
        }
        Command::Config(ConfigCommand::Set(set)) => {
            let mut config = cover_ai::load_config(&store)?;
            apply_settings(&mut config, &set);
            cover_ai::save_config(&store, &config)?;
            print!("{}", describe_config(&config));
        }
    }
    Ok(())
}
