// Domain models - Core types and data structures

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::clock::PlaybackClock;
use crate::domain::errors::DomainError;
use crate::domain::markers::{ActiveMarker, MarkerPair};

/// Container extension every export is written with
pub const OUTPUT_EXTENSION: &str = "mp4";

/// The active editing context: loaded file, playback mirror and markers
#[derive(Debug, Clone, Default)]
pub struct Session {
    source_path: Option<PathBuf>,
    pub clock: PlaybackClock,
    pub markers: MarkerPair,
}

impl Session {
    /// Session with nothing loaded
    pub fn empty() -> Self {
        Self::default()
    }

    /// Fresh session for a newly opened file: position 0, duration unknown,
    /// markers cleared
    pub fn open(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: Some(source_path.into()),
            clock: PlaybackClock::new(),
            markers: MarkerPair::new(),
        }
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.source_path
            .as_ref()
            .is_some_and(|p| !p.as_os_str().is_empty())
    }
}

/// A validated cut, immutable once built
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CutRequest {
    source_path: PathBuf,
    start_ms: u64,
    end_ms: u64,
}

impl CutRequest {
    /// Only the validator builds requests, so every instance satisfies `end > start`
    pub(crate) fn new(source_path: PathBuf, start_ms: u64, end_ms: u64) -> Self {
        Self {
            source_path,
            start_ms,
            end_ms,
        }
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn start_ms(&self) -> u64 {
        self.start_ms
    }

    pub fn end_ms(&self) -> u64 {
        self.end_ms
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }
}

/// Video encoder parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoEncoding {
    pub codec: String,
    pub preset: String,
    pub crf: u8,
    pub pixel_format: String,
}

/// Audio encoder parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioEncoding {
    pub codec: String,
    pub bitrate_kbps: u32,
}

/// Fixed transcode policy: fast constant-quality H.264, AAC audio and a
/// pixel format every common player can decode
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodingPolicy {
    pub video: VideoEncoding,
    pub audio: AudioEncoding,
}

impl Default for EncodingPolicy {
    fn default() -> Self {
        Self {
            video: VideoEncoding {
                codec: "libx264".to_string(),
                preset: "veryfast".to_string(),
                crf: 20,
                pixel_format: "yuv420p".to_string(),
            },
            audio: AudioEncoding {
                codec: "aac".to_string(),
                bitrate_kbps: 160,
            },
        }
    }
}

/// Fully resolved parameters for one transcode attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportPlan {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Seconds with millisecond precision, e.g. `"5.000"`
    pub start_seconds: String,
    pub end_seconds: String,
    pub video: VideoEncoding,
    pub audio: AudioEncoding,
}

/// Why a transcode attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// Process ran and exited non-zero (or was killed by a signal)
    Exited,
    /// Process could not be started
    Launch,
    /// Cancelled by the user
    Cancelled,
    /// Killed after the configured timeout
    TimedOut { after_secs: u64 },
}

/// Result of running the transcoder once
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TranscodeOutcome {
    Success {
        output_path: PathBuf,
    },
    Failure {
        reason: FailureReason,
        exit_code: Option<i32>,
        stderr_excerpt: String,
    },
}

impl TranscodeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TranscodeOutcome::Success { .. })
    }

    /// Failure outcome for a process that could not be spawned
    pub fn launch_failure(message: impl Into<String>) -> Self {
        TranscodeOutcome::Failure {
            reason: FailureReason::Launch,
            exit_code: None,
            stderr_excerpt: message.into(),
        }
    }

    /// Failure outcome for a user cancellation
    pub fn cancelled() -> Self {
        TranscodeOutcome::Failure {
            reason: FailureReason::Cancelled,
            exit_code: None,
            stderr_excerpt: String::new(),
        }
    }

    /// Classified error for a failed outcome
    pub fn error(&self) -> Option<DomainError> {
        match self {
            TranscodeOutcome::Success { .. } => None,
            TranscodeOutcome::Failure {
                reason,
                exit_code,
                stderr_excerpt,
            } => Some(match reason {
                FailureReason::Exited => DomainError::TranscodeFailure {
                    exit_code: *exit_code,
                    stderr: stderr_excerpt.clone(),
                },
                FailureReason::Launch => DomainError::LaunchFailure(stderr_excerpt.clone()),
                FailureReason::Cancelled => DomainError::Cancelled,
                FailureReason::TimedOut { after_secs } => DomainError::TimedOut(*after_secs),
            }),
        }
    }
}

/// What the post-export workflow reports back to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkflowResult {
    /// Clip exported; the original was deleted when requested
    Success {
        output_path: PathBuf,
        original_deleted: bool,
    },
    /// Clip exported but the original is still on disk
    SuccessWithDeleteFailure { output_path: PathBuf, error: String },
    /// Nothing was produced
    Failure { reason: String },
}

impl WorkflowResult {
    /// Both success variants
    pub fn is_exported(&self) -> bool {
        !matches!(self, WorkflowResult::Failure { .. })
    }

    pub fn output_path(&self) -> Option<&Path> {
        match self {
            WorkflowResult::Success { output_path, .. }
            | WorkflowResult::SuccessWithDeleteFailure { output_path, .. } => Some(output_path),
            WorkflowResult::Failure { .. } => None,
        }
    }
}

impl fmt::Display for WorkflowResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowResult::Success {
                output_path,
                original_deleted: true,
            } => write!(
                f,
                "Export complete. Original deleted, new file saved: {}",
                output_path.display()
            ),
            WorkflowResult::Success { output_path, .. } => {
                write!(f, "Export complete. Saved: {}", output_path.display())
            }
            WorkflowResult::SuccessWithDeleteFailure { output_path, error } => write!(
                f,
                "Clip exported to {}, but deleting the original failed: {}",
                output_path.display(),
                error
            ),
            WorkflowResult::Failure { reason } => write!(f, "Export failed: {}", reason),
        }
    }
}

/// Events published to UI collaborators (timeline, dialogs, status line)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    SessionOpened {
        path: PathBuf,
    },
    MarkersChanged {
        start_ms: Option<u64>,
        end_ms: Option<u64>,
    },
    ActiveMarkerChanged {
        active: ActiveMarker,
    },
    MarkersCleared,
    ExportStarted {
        output_path: PathBuf,
    },
    ExportFinished {
        result: WorkflowResult,
    },
    SourceDeleted {
        path: PathBuf,
    },
}
