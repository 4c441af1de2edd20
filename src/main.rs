//! clipmark
//!
//! Mark in/out points on a video and export the clip through ffmpeg.
//!
//! # Usage
//!
//! ```bash
//! clipmark export --input match.mkv --start 00:01:00 --end 00:02:30 --name goal
//! clipmark plan --input match.mkv --start 60 --end 150
//! clipmark session --input match.mkv
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use clipmark::cli::{commands, Cli, Commands};
use clipmark::config_initialization::initialize_configuration;
use clipmark::utils::logging::init_logging;
use clipmark::ClipmarkError;

/// Main entry point for the clipmark CLI
#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<ClipmarkError>()
            .map(ClipmarkError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = initialize_configuration(&cli)?;
    init_logging(&config.logging);
    debug!(?config, "Configuration resolved");

    match cli.command {
        Commands::Export(args) => commands::export(&config, args).await,
        Commands::Plan(args) => commands::plan(&config, args),
        Commands::Session(args) => commands::session(&config, args).await,
    }
}
