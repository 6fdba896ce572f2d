//! Sluice CLI
//!
//! Command-line pipeline browser for a data collector: list, filter and
//! select pipelines, then run bulk operations on the selection.

mod commands;
mod config;
mod preferences;
mod prompt;
mod transport;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sluice")]
#[command(about = "Data collector pipeline browser", long_about = None)]
struct Cli {
    /// Data collector URL
    #[arg(
        long,
        env = "SLUICE_COLLECTOR_URL",
        default_value = "http://localhost:18630"
    )]
    collector_url: String,

    /// Pipelines fetched per page
    #[arg(long, env = "SLUICE_PAGE_SIZE")]
    page_size: Option<usize>,

    /// Request timeout in seconds
    #[arg(long, env = "SLUICE_REQUEST_TIMEOUT")]
    timeout: Option<u64>,

    /// Path of the saved list preferences
    #[arg(long, env = "SLUICE_PREFERENCES")]
    preferences: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sluice_cli=info,sluice_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::new(cli.collector_url, cli.page_size, cli.timeout, cli.preferences)?;

    handle_command(cli.command, &config).await
}
