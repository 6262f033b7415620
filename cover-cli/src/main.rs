//! # Cover Canvas CLI
//!
//! Entry point for the `cover` binary.

use clap::Parser;
use cover_cli::{init_tracing, run, CliArgs};

fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    tracing::debug!(config_dir = %args.config_dir.display(), "Starting cover");

    run(args)
}
