//! CLI module for clipmark
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::adapters::toml_config::CONFIG_ENV;

pub mod args;
pub mod commands;
pub mod observer;
pub mod session;

/// clipmark
///
/// Mark an in-point and an out-point on a video and export the slice as a
/// re-encoded MP4 through ffmpeg, optionally replacing the original.
#[derive(Parser, Debug)]
#[command(name = "clipmark")]
#[command(about = "Mark in/out points on a video and export the clip through ffmpeg")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file (default: ./clipmark.toml when present)
    #[arg(long, global = true, env = CONFIG_ENV)]
    pub config: Option<PathBuf>,

    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// ffmpeg binary to run
    #[arg(long, global = true)]
    pub ffmpeg: Option<PathBuf>,

    /// ffprobe binary used to read durations
    #[arg(long, global = true)]
    pub ffprobe: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export a clip in one shot
    Export(args::ExportArgs),
    /// Print the ffmpeg command an export would run, without running it
    Plan(args::PlanArgs),
    /// Drive a marking session with commands read from stdin
    Session(args::SessionArgs),
}
