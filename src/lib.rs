//! clipmark library
//!
//! Mark an in-point and an out-point on a video timeline and export the slice
//! as a re-encoded MP4 through an external ffmpeg, optionally replacing the
//! source file afterward.
//!
//! The core is [`app::ExportController`]: it owns the single editing
//! [`domain::model::Session`] and reaches the playback engine, the
//! transcoder and the filesystem only through the traits in [`ports`].

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod error;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use app::{ExportController, ExportHandle, ExportJob, PostExportWorkflow};
pub use domain::errors::DomainError;
pub use domain::model::{ExportPlan, Session, SessionEvent, TranscodeOutcome, WorkflowResult};
pub use error::{ClipmarkError, ClipmarkResult};
