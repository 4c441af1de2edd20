// Playback clock - Clamped mirror of the playback engine's position

use crate::utils::time::format_clock;

/// Tracks media duration and playback position as reported by the engine.
///
/// The clock never runs on its own: position arrives push-style from the
/// playback engine, and seek/nudge only compute a clamped target that the
/// caller forwards to the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackClock {
    duration_ms: u64,
    position_ms: u64,
    dragging: bool,
}

impl PlaybackClock {
    /// Create a clock for a freshly opened source (duration unknown)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn position_ms(&self) -> u64 {
        self.position_ms
    }

    /// Engine reported the media duration
    pub fn on_duration_known(&mut self, duration_ms: u64) {
        self.duration_ms = duration_ms;
        self.position_ms = self.position_ms.min(duration_ms);
    }

    /// Engine reported a new position. Ignored while the user drags the timeline.
    ///
    /// Returns true when the mirror was updated.
    pub fn on_position_update(&mut self, position_ms: u64) -> bool {
        if self.dragging {
            return false;
        }
        self.position_ms = position_ms.min(self.duration_ms);
        true
    }

    /// Timeline control pressed or released
    pub fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
    }

    /// Request an absolute position, clamped to `[0, duration]`
    pub fn seek(&mut self, target_ms: i64) -> u64 {
        let clamped = self.clamp(target_ms);
        self.position_ms = clamped;
        clamped
    }

    /// Request a relative move from the current position, clamped to `[0, duration]`
    pub fn nudge(&mut self, delta_ms: i64) -> u64 {
        let target = (self.position_ms as i64).saturating_add(delta_ms);
        self.seek(target)
    }

    fn clamp(&self, target_ms: i64) -> u64 {
        if target_ms <= 0 {
            0
        } else {
            (target_ms as u64).min(self.duration_ms)
        }
    }

    /// Position and duration for display, e.g. `01:05 / 10:00`.
    ///
    /// Uses `hh:mm:ss` once the media is an hour or longer; empty until
    /// either value is known.
    pub fn display(&self) -> String {
        if self.position_ms == 0 && self.duration_ms == 0 {
            return String::new();
        }
        let long = self.duration_ms >= 3_600_000;
        format!(
            "{} / {}",
            format_clock(self.position_ms, long),
            format_clock(self.duration_ms, long)
        )
    }
}
