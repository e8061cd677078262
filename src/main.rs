use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod batch;
mod config;
mod error;
mod export;
mod import;
mod state;
mod ui;

use config::Config;

/// Clash issue review and report export
#[derive(Parser, Debug)]
#[command(name = "clash-report")]
#[command(about = "Review clash viewpoints, annotate them and export reports")]
#[command(version)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "FILE", env = "CLASH_REPORT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the import/filter/export pipeline without a window
    Batch(batch::BatchArgs),
}

fn init_tracing(default_filter: &str) {
    // RUST_LOG wins over the config file
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    init_tracing(&config.log_filter);
    info!("Starting clash-report v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(Command::Batch(args)) => batch::run(args, &config),
        None => {
            ui::run(config).context("Review window failed")?;
            Ok(())
        }
    }
}
