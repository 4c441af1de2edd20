// Marker state machine - In/out markers and the active marker toggle

use serde::{Deserialize, Serialize};

/// Gap left before the end of the media when the end marker is filled in
/// automatically.
pub const DEFAULT_END_GAP_MS: u64 = 100;

/// Which marker the next "set marker" action writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveMarker {
    #[default]
    Start,
    End,
}

impl ActiveMarker {
    /// The other marker
    pub fn toggled(self) -> Self {
        match self {
            ActiveMarker::Start => ActiveMarker::End,
            ActiveMarker::End => ActiveMarker::Start,
        }
    }

    /// Label for the swap control
    pub fn label(self) -> &'static str {
        match self {
            ActiveMarker::Start => "Start",
            ActiveMarker::End => "End",
        }
    }
}

/// In/out markers owned by a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MarkerPair {
    start_ms: Option<u64>,
    end_ms: Option<u64>,
    active: ActiveMarker,
}

impl MarkerPair {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_ms(&self) -> Option<u64> {
        self.start_ms
    }

    pub fn end_ms(&self) -> Option<u64> {
        self.end_ms
    }

    pub fn active(&self) -> ActiveMarker {
        self.active
    }

    /// Flip the active marker between start and end
    pub fn toggle_active(&mut self) -> ActiveMarker {
        self.active = self.active.toggled();
        self.active
    }

    /// Write `position_ms` into the active marker.
    ///
    /// An unset end marker is first filled with `duration - 100ms`, so setting
    /// only a start still yields a usable trailing cut. The active marker is
    /// left unchanged.
    pub fn set_active_at(&mut self, position_ms: u64, duration_ms: u64) {
        self.fill_default_end(duration_ms);
        match self.active {
            ActiveMarker::Start => self.start_ms = Some(position_ms),
            ActiveMarker::End => self.end_ms = Some(position_ms),
        }
    }

    /// Provisional end marker, applied only while the end is unset
    fn fill_default_end(&mut self, duration_ms: u64) {
        if self.end_ms.is_none() {
            self.end_ms = Some(duration_ms.saturating_sub(DEFAULT_END_GAP_MS));
        }
    }

    /// User-facing clear: both markers unset, start marker active again
    pub fn clear(&mut self) {
        self.reset();
    }

    /// Back to the state of a new session
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_is_involution() {
        let mut markers = MarkerPair::new();
        let original = markers.active();
        markers.toggle_active();
        assert_eq!(markers.active(), ActiveMarker::End);
        markers.toggle_active();
        assert_eq!(markers.active(), original);
    }

    #[test]
    fn test_setting_start_fills_default_end() {
        let mut markers = MarkerPair::new();
        markers.set_active_at(2_000, 60_000);
        assert_eq!(markers.start_ms(), Some(2_000));
        assert_eq!(markers.end_ms(), Some(59_900));
        assert_eq!(markers.active(), ActiveMarker::Start);
    }

    #[test]
    fn test_default_end_saturates_on_short_media() {
        let mut markers = MarkerPair::new();
        markers.set_active_at(0, 40);
        assert_eq!(markers.end_ms(), Some(0));
    }

    #[test]
    fn test_set_writes_only_active_field() {
        let mut markers = MarkerPair::new();
        markers.set_active_at(2_000, 60_000);
        markers.toggle_active();
        markers.set_active_at(10_000, 60_000);
        assert_eq!(markers.start_ms(), Some(2_000));
        assert_eq!(markers.end_ms(), Some(10_000));

        // default fill happens once; later writes leave the end alone
        markers.toggle_active();
        markers.set_active_at(3_000, 60_000);
        assert_eq!(markers.start_ms(), Some(3_000));
        assert_eq!(markers.end_ms(), Some(10_000));
    }

    #[test]
    fn test_end_first_leaves_start_unset() {
        let mut markers = MarkerPair::new();
        markers.toggle_active();
        markers.set_active_at(8_000, 60_000);
        assert_eq!(markers.start_ms(), None);
        assert_eq!(markers.end_ms(), Some(8_000));
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut markers = MarkerPair::new();
        markers.toggle_active();
        markers.set_active_at(8_000, 60_000);
        markers.reset();
        assert_eq!(markers, MarkerPair::new());
        assert_eq!(markers.active(), ActiveMarker::Start);
    }

    #[test]
    fn test_clear_rearms_start_marker() {
        let mut markers = MarkerPair::new();
        markers.toggle_active();
        markers.set_active_at(8_000, 60_000);
        markers.clear();
        assert_eq!(markers.start_ms(), None);
        assert_eq!(markers.end_ms(), None);
        assert_eq!(markers.active(), ActiveMarker::Start);
    }
}
