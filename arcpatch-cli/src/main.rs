//! Arcpatch CLI
//!
//! Command-line interface for the arcpatch auto-apply pipeline: runs
//! the save pipeline over edited source files, drives the maintenance
//! scripts, manages the translated image and the per-project settings.

mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "arcpatch")]
#[command(about = "Save -> auto-apply pipeline for localized game data", long_about = None)]
struct Cli {
    /// Settings file location
    #[arg(long, env = "ARCPATCH_SETTINGS", default_value = "arcpatch.json")]
    settings: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arcpatch_engine=info,arcpatch_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    handle_command(cli.command, &cli.settings).await
}
