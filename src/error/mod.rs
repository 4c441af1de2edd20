//! Error handling module for clipmark

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Main error type for clipmark operations
#[derive(Error, Debug)]
pub enum ClipmarkError {
    /// Marker, validation, transcode or workflow error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Explicitly requested config file does not exist
    #[error("Config file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// Invalid time argument
    #[error("Invalid time format: {time}. Expected HH:MM:SS.ms, MM:SS.ms, or seconds")]
    InvalidTimeFormat { time: String },

    /// Unrecognized interactive session command
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Export finished without producing a clip
    #[error("{0}")]
    ExportFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ClipmarkError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            ClipmarkError::Domain(e) if e.is_validation() => 2,
            ClipmarkError::InvalidTimeFormat { .. } | ClipmarkError::InvalidCommand(_) => 2,
            ClipmarkError::ConfigNotFound { .. } | ClipmarkError::Domain(DomainError::Config(_)) => 3,
            _ => 1,
        }
    }
}

/// Result type alias for clipmark operations
pub type ClipmarkResult<T> = std::result::Result<T, ClipmarkError>;
