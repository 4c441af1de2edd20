//! Headless playback engine
//!
//! Stands in for a rendering media player on the command line. It tracks the
//! loaded source, playhead and play state, and queues the same
//! duration/position notifications a real player would push.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::domain::errors::*;
use crate::ports::*;

#[derive(Debug, Default)]
struct PlayerState {
    source: Option<PathBuf>,
    duration_ms: u64,
    position_ms: u64,
    playing: bool,
    events: VecDeque<PlaybackEvent>,
}

/// Playback adapter without video output
pub struct HeadlessPlayer {
    probe: Arc<dyn ProbePort>,
    state: Mutex<PlayerState>,
}

impl HeadlessPlayer {
    pub fn new(probe: Arc<dyn ProbePort>) -> Self {
        Self {
            probe,
            state: Mutex::new(PlayerState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, PlayerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Take every notification queued since the last call
    pub fn drain_events(&self) -> Vec<PlaybackEvent> {
        self.state().events.drain(..).collect()
    }

    pub fn is_playing(&self) -> bool {
        self.state().playing
    }

    pub fn source(&self) -> Option<PathBuf> {
        self.state().source.clone()
    }
}

impl PlaybackPort for HeadlessPlayer {
    fn set_source(&self, path: &Path) -> Result<(), DomainError> {
        if !path.is_file() {
            return Err(DomainError::SourceUnavailable(format!(
                "{} is not a readable file",
                path.display()
            )));
        }

        // Probe outside the lock; ffprobe can take a while on large files
        let probed = self.probe.probe_duration_ms(path);

        let mut state = self.state();
        state.source = Some(path.to_path_buf());
        state.position_ms = 0;
        state.playing = false;
        state.events.clear();

        match probed {
            Ok(duration_ms) => {
                debug!("Loaded {} ({} ms)", path.display(), duration_ms);
                state.duration_ms = duration_ms;
                state.events.push_back(PlaybackEvent::DurationChanged(duration_ms));
                state.events.push_back(PlaybackEvent::PositionChanged(0));
            }
            Err(e) => {
                warn!("Duration unknown for {}: {}", path.display(), e);
                state.duration_ms = 0;
            }
        }
        Ok(())
    }

    fn set_position(&self, position_ms: u64) {
        let mut state = self.state();
        if state.source.is_none() {
            return;
        }
        let clamped = position_ms.min(state.duration_ms);
        state.position_ms = clamped;
        state.events.push_back(PlaybackEvent::PositionChanged(clamped));
    }

    fn play(&self) {
        let mut state = self.state();
        if state.source.is_some() {
            state.playing = true;
        }
    }

    fn pause(&self) {
        self.state().playing = false;
    }

    fn unload(&self) {
        *self.state() = PlayerState::default();
    }
}
