use std::sync::Arc;

use crate::adapters::{AppConfig, FFprobeAdapter, FfmpegTranscoder, HeadlessPlayer, LocalFsAdapter};
use crate::app::controller::ExportController;
use crate::ports::{FsPort, PlaybackPort, ProbePort, SessionObserver, TranscodePort};

/// Builds the concrete adapter graph
pub trait AppContainer: Send + Sync {
    fn export_controller(&self, observer: Arc<dyn SessionObserver>) -> ExportController;
}

/// Production wiring: ffmpeg, ffprobe, local filesystem and the headless player
pub struct DefaultAppContainer {
    transcode_port: Arc<FfmpegTranscoder>,
    fs_port: Arc<LocalFsAdapter>,
    player: Arc<HeadlessPlayer>,
}

impl DefaultAppContainer {
    pub fn new(config: &AppConfig) -> Self {
        let probe_port = Arc::new(FFprobeAdapter::new(config.probe.binary.clone()));
        let transcode_port = Arc::new(
            FfmpegTranscoder::new(config.transcoder.binary.clone())
                .with_timeout(config.transcoder.timeout())
                .with_atomic_output(config.output.atomic),
        );
        let fs_port = Arc::new(LocalFsAdapter::new());
        let player = Arc::new(HeadlessPlayer::new(probe_port as Arc<dyn ProbePort>));

        Self {
            transcode_port,
            fs_port,
            player,
        }
    }

    /// The playback engine, for draining its notifications
    pub fn player(&self) -> Arc<HeadlessPlayer> {
        Arc::clone(&self.player)
    }

    pub fn transcoder(&self) -> Arc<dyn TranscodePort> {
        Arc::clone(&self.transcode_port) as Arc<dyn TranscodePort>
    }
}

impl AppContainer for DefaultAppContainer {
    fn export_controller(&self, observer: Arc<dyn SessionObserver>) -> ExportController {
        ExportController::new(
            Arc::clone(&self.player) as Arc<dyn PlaybackPort>,
            Arc::clone(&self.transcode_port) as Arc<dyn TranscodePort>,
            Arc::clone(&self.fs_port) as Arc<dyn FsPort>,
            observer,
        )
    }
}
