// Domain errors - Error types for the domain layer

use thiserror::Error;

/// Domain-specific error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// No media file is loaded in the session
    #[error("No source loaded: open a video file first")]
    NoSourceLoaded,

    /// Start or end marker has not been set
    #[error("Markers incomplete: both start and end must be set")]
    MarkersIncomplete,

    /// End marker is not after the start marker
    #[error("Invalid range: end ({end_ms} ms) must be after start ({start_ms} ms)")]
    InvalidRange { start_ms: u64, end_ms: u64 },

    /// Output name is empty after trimming
    #[error("Output name cannot be empty")]
    EmptyName,

    /// Output name cannot be used in the source directory
    #[error("Invalid output name: {0}")]
    InvalidName(String),

    /// Transcoder exited with a non-zero status
    #[error("Transcode failed (exit code {}): {stderr}", exit_code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    TranscodeFailure { exit_code: Option<i32>, stderr: String },

    /// Transcoder binary could not be started
    #[error("Failed to launch transcoder: {0}")]
    LaunchFailure(String),

    /// Transcode was cancelled by the user
    #[error("Transcode cancelled")]
    Cancelled,

    /// Transcode exceeded the configured timeout
    #[error("Transcode timed out after {0}s")]
    TimedOut(u64),

    /// Source file could not be deleted
    #[error("Failed to delete original: {0}")]
    DeleteFailure(String),

    /// Media file is missing or not a regular file
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// Exported clip could not be opened as the new session
    #[error("Failed to reopen exported clip: {0}")]
    ReopenFailure(String),

    /// Media duration could not be determined
    #[error("Failed to probe media: {0}")]
    ProbeFailure(String),

    /// An export is already running for this session
    #[error("An export is already in progress")]
    ExportInProgress,

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DomainError {
    /// True for errors detected before any external process runs
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DomainError::NoSourceLoaded
                | DomainError::MarkersIncomplete
                | DomainError::InvalidRange { .. }
                | DomainError::EmptyName
                | DomainError::InvalidName(_)
        )
    }
}
