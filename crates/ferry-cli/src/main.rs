//! ferry: queue local files for a remote ingest pipeline.
//!
//! The queue lives in a state directory, so an interrupted `ingest` picks up
//! where it stopped on the next `resume`.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ferry_core::FerryConfig;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ferry")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Base URL of the ingest pipeline (overrides the config file).
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Directory holding the queue snapshot (overrides the config file).
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Queue files and process until nothing is pending.
    Ingest {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Process whatever the stored queue still has pending.
    Resume,
    /// Print the stored queue without processing it.
    Status {
        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Drop completed and failed items from the stored queue.
    Prune,
    /// Reopen a failed item and process it again.
    Retry { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = load_config(&args)?;
    debug!(endpoint = %config.remote.endpoint, state_dir = %config.storage.state_dir.display(), "configuration loaded");

    match args.command {
        Command::Ingest { paths } => commands::ingest(&config, paths).await,
        Command::Resume => commands::resume(&config).await,
        Command::Status { json } => commands::status(&config, json).await,
        Command::Prune => commands::prune(&config).await,
        Command::Retry { id } => commands::retry(&config, &id).await,
    }
}

fn load_config(args: &Args) -> anyhow::Result<FerryConfig> {
    let mut config = match &args.config {
        Some(path) => FerryConfig::load(path)?,
        None => FerryConfig::default(),
    };
    if let Some(endpoint) = &args.endpoint {
        config.remote.endpoint = endpoint.clone();
    }
    if let Some(dir) = &args.state_dir {
        config.storage.state_dir = dir.clone();
    }
    Ok(config)
}
