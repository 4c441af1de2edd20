//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

/// Cut selection shared by `export` and `plan`
#[derive(Args, Debug)]
pub struct CutArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Start marker (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(short, long, allow_hyphen_values = true)]
    pub start: String,

    /// End marker (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(short, long, allow_hyphen_values = true)]
    pub end: String,

    /// Output file name, written next to the input (default: CUT_<name>.mp4)
    #[arg(short, long)]
    pub name: Option<String>,
}

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub cut: CutArgs,

    /// Delete the input once the clip has been written and reopened
    #[arg(long)]
    pub delete_original: bool,

    /// Media duration, when ffprobe is unavailable
    #[arg(long)]
    pub duration: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub cut: CutArgs,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the session command
#[derive(Args, Debug)]
pub struct SessionArgs {
    /// File to open before reading commands
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Print events as JSON lines
    #[arg(long)]
    pub json: bool,
}
