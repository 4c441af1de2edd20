//! Console rendering of session events

use crate::domain::model::SessionEvent;
use crate::ports::SessionObserver;
use crate::utils::time::format_seconds_ms;

/// Prints session events to stdout, as text or JSON lines
pub struct ConsoleObserver {
    json: bool,
}

impl ConsoleObserver {
    pub fn new(json: bool) -> Self {
        Self { json }
    }
}

impl SessionObserver for ConsoleObserver {
    fn on_event(&self, event: &SessionEvent) {
        if self.json {
            match serde_json::to_string(event) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::warn!("Failed to serialize event: {}", e),
            }
        } else {
            println!("{}", render_event(event));
        }
    }
}

fn marker_text(ms: Option<u64>) -> String {
    ms.map(format_seconds_ms).unwrap_or_else(|| "-".to_string())
}

/// Human-readable line for an event
pub fn render_event(event: &SessionEvent) -> String {
    match event {
        SessionEvent::SessionOpened { path } => format!("opened {}", path.display()),
        SessionEvent::MarkersChanged { start_ms, end_ms } => format!(
            "markers start={} end={}",
            marker_text(*start_ms),
            marker_text(*end_ms)
        ),
        SessionEvent::ActiveMarkerChanged { active } => format!("active {}", active.label()),
        SessionEvent::MarkersCleared => "markers cleared".to_string(),
        SessionEvent::ExportStarted { output_path } => {
            format!("exporting {}", output_path.display())
        }
        SessionEvent::ExportFinished { result } => result.to_string(),
        SessionEvent::SourceDeleted { path } => format!("deleted {}", path.display()),
    }
}
