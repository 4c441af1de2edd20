// Export controller - Owns the session and drives marking and export

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::app::workflow::PostExportWorkflow;
use crate::domain::errors::*;
use crate::domain::markers::{ActiveMarker, MarkerPair};
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::ports::*;

/// Single-session controller. Marker, clock and validation work happens on
/// the caller's task; only the transcode awaits.
pub struct ExportController {
    session: Session,
    planner: ExportPlanner,
    playback_port: Arc<dyn PlaybackPort>,
    transcode_port: Arc<dyn TranscodePort>,
    fs_port: Arc<dyn FsPort>,
    workflow: PostExportWorkflow,
    observer: Arc<dyn SessionObserver>,
    playing: bool,
    exporting: bool,
}

impl ExportController {
    /// Create controller with injected ports
    pub fn new(
        playback_port: Arc<dyn PlaybackPort>,
        transcode_port: Arc<dyn TranscodePort>,
        fs_port: Arc<dyn FsPort>,
        observer: Arc<dyn SessionObserver>,
    ) -> Self {
        Self {
            session: Session::empty(),
            planner: ExportPlanner::new(),
            playback_port,
            transcode_port,
            workflow: PostExportWorkflow::new(Arc::clone(&fs_port)),
            fs_port,
            observer,
            playing: false,
            exporting: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn markers(&self) -> &MarkerPair {
        &self.session.markers
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    pub fn transcoder(&self) -> Arc<dyn TranscodePort> {
        Arc::clone(&self.transcode_port)
    }

    /// Suggested export name for the loaded file
    pub fn default_output_name(&self) -> Option<String> {
        self.session.source_path().map(ExportPlanner::default_output_name)
    }

    fn emit(&self, event: SessionEvent) {
        self.observer.on_event(&event);
    }

    // ---- session & playback ----

    /// Open a media file as a fresh session and start playback
    pub fn open(&mut self, path: &Path) -> Result<(), DomainError> {
        if self.exporting {
            return Err(DomainError::ExportInProgress);
        }
        self.load(path)
    }

    /// Full session reset onto `path`: position 0, duration unknown, markers cleared
    fn load(&mut self, path: &Path) -> Result<(), DomainError> {
        self.playback_port.set_source(path)?;
        self.session = Session::open(path);
        self.playback_port.play();
        self.playing = true;
        info!("Opened {}", path.display());
        self.emit(SessionEvent::SessionOpened {
            path: path.to_path_buf(),
        });
        Ok(())
    }

    /// Feed a notification from the playback engine
    pub fn handle_playback_event(&mut self, event: PlaybackEvent) {
        match event {
            PlaybackEvent::DurationChanged(ms) => self.on_duration_known(ms),
            PlaybackEvent::PositionChanged(ms) => {
                self.on_position_update(ms);
            }
        }
    }

    pub fn on_duration_known(&mut self, duration_ms: u64) {
        debug!("Duration known: {} ms", duration_ms);
        self.session.clock.on_duration_known(duration_ms);
    }

    /// Returns false when the update was ignored because the user is dragging
    pub fn on_position_update(&mut self, position_ms: u64) -> bool {
        self.session.clock.on_position_update(position_ms)
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        self.session.clock.set_dragging(dragging);
    }

    /// Jump to an absolute position; returns the clamped target
    pub fn seek(&mut self, target_ms: i64) -> u64 {
        let target = self.session.clock.seek(target_ms);
        if self.session.is_loaded() {
            self.playback_port.set_position(target);
        }
        target
    }

    /// Move relative to the current position; returns the clamped target
    pub fn nudge(&mut self, delta_ms: i64) -> u64 {
        let target = self.session.clock.nudge(delta_ms);
        if self.session.is_loaded() {
            self.playback_port.set_position(target);
        }
        target
    }

    pub fn play(&mut self) {
        if self.session.is_loaded() {
            self.playback_port.play();
            self.playing = true;
        }
    }

    pub fn pause(&mut self) {
        self.playback_port.pause();
        self.playing = false;
    }

    /// Play when paused, pause when playing. Returns whether it now plays.
    pub fn toggle_playback(&mut self) -> bool {
        if self.playing {
            self.pause();
        } else {
            self.play();
        }
        self.playing
    }

    /// Delete the loaded file from disk.
    ///
    /// The engine releases the file and the session is emptied before the
    /// removal, so a failed removal still leaves nothing loaded.
    pub async fn delete_source(&mut self) -> Result<PathBuf, DomainError> {
        if self.exporting {
            return Err(DomainError::ExportInProgress);
        }
        let path = self
            .session
            .source_path()
            .map(Path::to_path_buf)
            .ok_or(DomainError::NoSourceLoaded)?;
        if !self.fs_port.file_exists(&path).await {
            return Err(DomainError::SourceUnavailable(format!(
                "{} no longer exists",
                path.display()
            )));
        }

        self.playback_port.unload();
        self.session = Session::empty();
        self.playing = false;

        if let Err(e) = self.fs_port.remove_file(&path).await {
            let error = DomainError::DeleteFailure(format!("{}: {}", path.display(), e));
            warn!("{}", error);
            return Err(error);
        }
        info!("Deleted {}", path.display());
        self.emit(SessionEvent::SourceDeleted { path: path.clone() });
        Ok(path)
    }

    pub fn display_time(&self) -> String {
        self.session.clock.display()
    }

    // ---- markers ----

    pub fn toggle_active_marker(&mut self) -> ActiveMarker {
        let active = self.session.markers.toggle_active();
        debug!("Active marker: {}", active.label());
        self.emit(SessionEvent::ActiveMarkerChanged { active });
        active
    }

    /// Write the current position into the active marker
    pub fn set_marker(&mut self) -> &MarkerPair {
        let position = self.session.clock.position_ms();
        let duration = self.session.clock.duration_ms();
        self.session.markers.set_active_at(position, duration);

        let markers = &self.session.markers;
        debug!(
            active = markers.active().label(),
            start_ms = ?markers.start_ms(),
            end_ms = ?markers.end_ms(),
            "Marker set at {} ms",
            position
        );
        self.emit(SessionEvent::MarkersChanged {
            start_ms: markers.start_ms(),
            end_ms: markers.end_ms(),
        });
        &self.session.markers
    }

    pub fn clear_markers(&mut self) {
        self.session.markers.clear();
        debug!("Markers cleared");
        self.emit(SessionEvent::MarkersCleared);
    }

    // ---- export ----

    /// Validate the current cut and resolve its plan. No side effects.
    pub fn prepare_export(&self, output_name: &str) -> Result<ExportPlan, DomainError> {
        let markers = &self.session.markers;
        let request = CutValidator::validate(
            self.session.source_path(),
            markers.start_ms(),
            markers.end_ms(),
        )?;
        self.planner.plan(&request, output_name)
    }

    /// Prepare and mark the session as exporting. Pair with `complete_export`.
    pub fn begin_export(&mut self, output_name: &str) -> Result<ExportPlan, DomainError> {
        if self.exporting {
            return Err(DomainError::ExportInProgress);
        }
        let plan = self.prepare_export(output_name)?;
        self.exporting = true;
        info!(
            "Exporting {} -> {} [{}s..{}s]",
            plan.input_path.display(),
            plan.output_path.display(),
            plan.start_seconds,
            plan.end_seconds
        );
        self.emit(SessionEvent::ExportStarted {
            output_path: plan.output_path.clone(),
        });
        Ok(plan)
    }

    /// Validate, transcode and run the post-export workflow.
    ///
    /// Validation errors return `Err` before any process is started. Every
    /// outcome of the transcode itself is reported as a `WorkflowResult`.
    pub async fn confirm_export(
        &mut self,
        output_name: &str,
        delete_original: bool,
    ) -> Result<WorkflowResult, DomainError> {
        let plan = self.begin_export(output_name)?;
        let outcome = self.transcode_port.run(&plan, Cancellation::never()).await;
        Ok(self.complete_export(outcome, &plan, delete_original).await)
    }

    /// Run the post-export workflow for an outcome produced elsewhere
    pub async fn complete_export(
        &mut self,
        outcome: TranscodeOutcome,
        plan: &ExportPlan,
        delete_original: bool,
    ) -> WorkflowResult {
        self.exporting = false;

        let source: PathBuf = plan.input_path.clone();
        let workflow = self.workflow.clone();
        let result = workflow
            .run(outcome, plan, delete_original, &source, |clip| self.load(clip))
            .await;

        info!("{}", result);
        self.emit(SessionEvent::ExportFinished {
            result: result.clone(),
        });
        result
    }
}
