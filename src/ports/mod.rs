// Ports - Interface definitions (contracts)

use std::io;
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::domain::errors::DomainError;
use crate::domain::model::*;

/// Events pushed by the playback engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    DurationChanged(u64),
    PositionChanged(u64),
}

/// Port for the media playback engine
pub trait PlaybackPort: Send + Sync {
    /// Load a new media file. Fails when the file cannot be opened at all.
    fn set_source(&self, path: &Path) -> Result<(), DomainError>;

    /// Move the playhead
    fn set_position(&self, position_ms: u64);

    fn play(&self);

    fn pause(&self);

    /// Stop playback and release the loaded file
    fn unload(&self);
}

/// Port for media duration probing
pub trait ProbePort: Send + Sync {
    /// Total duration of the media at `path`, in milliseconds
    fn probe_duration_ms(&self, path: &Path) -> Result<u64, DomainError>;
}

/// Port for file system operations
#[async_trait]
pub trait FsPort: Send + Sync {
    /// Check if file exists
    async fn file_exists(&self, path: &Path) -> bool;

    /// Delete file
    async fn remove_file(&self, path: &Path) -> io::Result<()>;
}

/// Port for the external transcoder
#[async_trait]
pub trait TranscodePort: Send + Sync {
    /// Run one transcode attempt to completion, cancellation or timeout
    async fn run(&self, plan: &ExportPlan, cancel: Cancellation) -> TranscodeOutcome;

    /// Program and arguments that `run` would execute, for display
    fn command_line(&self, plan: &ExportPlan) -> Vec<String>;
}

/// Receives session events for rendering (timeline markers, dialogs)
pub trait SessionObserver: Send + Sync {
    fn on_event(&self, event: &SessionEvent);
}

/// Observer that ignores everything
pub struct NullObserver;

impl SessionObserver for NullObserver {
    fn on_event(&self, _event: &SessionEvent) {}
}

/// Cancellation signal handed to a running transcode
#[derive(Debug, Default)]
pub struct Cancellation {
    rx: Option<oneshot::Receiver<()>>,
}

impl Cancellation {
    /// A signal that never fires
    pub fn never() -> Self {
        Self { rx: None }
    }

    /// Sender/receiver pair; sending on the sender cancels
    pub fn pair() -> (oneshot::Sender<()>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx: Some(rx) })
    }

    /// Resolves once cancellation is requested. A dropped sender means the
    /// caller gave up its handle, not that it cancelled, so that case waits
    /// forever.
    pub async fn cancelled(&mut self) {
        match self.rx.as_mut() {
            Some(rx) => {
                if rx.await.is_err() {
                    self.rx = None;
                    std::future::pending::<()>().await;
                }
            }
            None => std::future::pending::<()>().await,
        }
    }
}
