//! Image Share - background photo processor for event photo walls.
//!
//! Watches the raw upload directory, normalizes orientation, renames each
//! photo to a random identifier and publishes it to the display directory.
//!
//! # Usage
//!
//! ```bash
//! # Run the processor until Ctrl-C / SIGTERM
//! image-share run
//!
//! # Process whatever is waiting right now, then exit
//! image-share process-once
//!
//! # List published photos as JSON
//! image-share photos --pretty
//!
//! # View configuration
//! image-share config show
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// Image Share - background photo processor for event photo walls.
#[derive(Parser, Debug)]
#[command(name = "image-share")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true, env = "IMAGE_SHARE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Monitor the raw directory and process uploads
    Run,

    /// Run a single poll cycle and print the report
    ProcessOnce,

    /// List photos in the display directory
    Photos(cli::photos::PhotosArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let lenient = matches!(cli.command, Commands::Config(_));
    let config = cli::load_startup_config(cli.config.as_deref(), lenient).with_context(|| {
        format!(
            "Failed to load config from {}",
            cli::config_path(cli.config.as_deref()).display()
        )
    })?;
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Image Share v{}", image_share_core::VERSION);

    match cli.command {
        Commands::Run => cli::run::execute(config).await,
        Commands::ProcessOnce => cli::run::execute_once(config).await,
        Commands::Photos(args) => cli::photos::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, cli.config.as_deref()).await,
    }
}
