//! FFmpeg execution adapter
//!
//! Runs the external `ffmpeg` binary once per export and classifies how it
//! ended. The invocation shape is fixed:
//!
//! ```text
//! ffmpeg -y -i <input> -ss <start> -to <end> -map 0:v:0? -map 0:a:0?
//!        -c:v <codec> -preset <preset> -crf <crf> -pix_fmt <fmt>
//!        -c:a <codec> -b:a <kbps>k <output>
//! ```

use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, Command};
use tracing::{debug, error, info, warn};

use crate::domain::model::*;
use crate::ports::*;
use crate::utils::path::{source_directory, temp_sibling_prefix};

/// Number of trailing stderr lines kept for diagnostics
const STDERR_TAIL_LINES: usize = 12;

/// Upper bound on the diagnostic excerpt
const STDERR_EXCERPT_MAX_CHARS: usize = 2_000;

/// How long to wait for stderr to close after killing the transcoder
const STDERR_DRAIN_GRACE: Duration = Duration::from_secs(2);

#[cfg(target_os = "windows")]
const CREATE_NO_WINDOW: u32 = 0x08000000;

/// FFmpeg-based transcode adapter
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    binary: PathBuf,
    timeout: Option<Duration>,
    atomic_output: bool,
}

impl FfmpegTranscoder {
    /// Create adapter for the given ffmpeg binary (a bare name is looked up on PATH)
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout: None,
            atomic_output: false,
        }
    }

    /// Kill the transcoder when it runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Write to a hidden temporary file and rename it into place on success
    pub fn with_atomic_output(mut self, atomic_output: bool) -> Self {
        self.atomic_output = atomic_output;
        self
    }

    /// Arguments for one transcode of `plan` writing to `output`
    pub fn build_args(plan: &ExportPlan, output: &Path) -> Vec<OsString> {
        let crf = plan.video.crf.to_string();
        let audio_bitrate = format!("{}k", plan.audio.bitrate_kbps);

        let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), plan.input_path.clone().into()];
        args.extend(
            [
                "-ss",
                plan.start_seconds.as_str(),
                "-to",
                plan.end_seconds.as_str(),
                // trailing '?' keeps audio-only or video-only sources from aborting
                "-map",
                "0:v:0?",
                "-map",
                "0:a:0?",
                "-c:v",
                plan.video.codec.as_str(),
                "-preset",
                plan.video.preset.as_str(),
                "-crf",
                crf.as_str(),
                "-pix_fmt",
                plan.video.pixel_format.as_str(),
                "-c:a",
                plan.audio.codec.as_str(),
                "-b:a",
                audio_bitrate.as_str(),
            ]
            .into_iter()
            .map(OsString::from),
        );
        args.push(output.as_os_str().to_os_string());
        args
    }

    fn command(&self, plan: &ExportPlan, output: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(Self::build_args(plan, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(target_os = "windows")]
        cmd.creation_flags(CREATE_NO_WINDOW);
        cmd
    }

    /// Temporary target next to the final output
    fn temp_target(plan: &ExportPlan) -> std::io::Result<tempfile::TempPath> {
        let dir = source_directory(&plan.output_path);
        let dir = if dir.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            dir
        };
        let suffix = plan
            .output_path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_else(|| format!(".{}", OUTPUT_EXTENSION));
        let file = tempfile::Builder::new()
            .prefix(&temp_sibling_prefix(&plan.output_path))
            .suffix(&suffix)
            .tempfile_in(dir)?;
        Ok(file.into_temp_path())
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl TranscodePort for FfmpegTranscoder {
    async fn run(&self, plan: &ExportPlan, mut cancel: Cancellation) -> TranscodeOutcome {
        let temp = if self.atomic_output {
            match Self::temp_target(plan) {
                Ok(temp) => Some(temp),
                Err(e) => {
                    error!("Failed to create temporary output next to {}: {}", plan.output_path.display(), e);
                    return TranscodeOutcome::launch_failure(format!(
                        "cannot create temporary output file: {}",
                        e
                    ));
                }
            }
        } else {
            None
        };
        let target: PathBuf = match &temp {
            Some(temp) => temp.to_path_buf(),
            None => plan.output_path.clone(),
        };

        info!(
            input = %plan.input_path.display(),
            output = %plan.output_path.display(),
            start = %plan.start_seconds,
            end = %plan.end_seconds,
            "Starting transcode"
        );
        debug!("Transcoder command: {}", self.command_line(plan).join(" "));

        let mut child = match self.command(plan, &target).spawn() {
            Ok(child) => child,
            Err(e) => {
                error!("Failed to launch {}: {}", self.binary.display(), e);
                return TranscodeOutcome::launch_failure(format!("{}: {}", self.binary.display(), e));
            }
        };

        let stderr_task = tokio::spawn(collect_stderr_tail(child.stderr.take()));

        let status = tokio::select! {
            status = child.wait() => status,
            _ = cancel.cancelled() => {
                warn!("Transcode cancelled, terminating {}", self.binary.display());
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill transcoder: {}", e);
                }
                stderr_task.abort();
                return TranscodeOutcome::cancelled();
            }
            _ = sleep_or_pending(self.timeout) => {
                let after_secs = self.timeout.map(|t| t.as_secs()).unwrap_or_default();
                warn!("Transcode exceeded {}s, terminating {}", after_secs, self.binary.display());
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill transcoder: {}", e);
                }
                let stderr_excerpt = tokio::time::timeout(STDERR_DRAIN_GRACE, stderr_task)
                    .await
                    .ok()
                    .and_then(Result::ok)
                    .unwrap_or_default();
                return TranscodeOutcome::Failure {
                    reason: FailureReason::TimedOut { after_secs },
                    exit_code: None,
                    stderr_excerpt,
                };
            }
        };

        let stderr_excerpt = stderr_task.await.unwrap_or_default();

        match status {
            Ok(status) if status.success() => {
                if let Some(temp) = temp {
                    if let Err(e) = temp.persist(&plan.output_path) {
                        error!("Failed to move finished clip into place: {}", e);
                        return TranscodeOutcome::Failure {
                            reason: FailureReason::Exited,
                            exit_code: Some(0),
                            stderr_excerpt: format!(
                                "transcode finished but renaming to {} failed: {}",
                                plan.output_path.display(),
                                e.error
                            ),
                        };
                    }
                }
                info!("Transcode finished: {}", plan.output_path.display());
                TranscodeOutcome::Success {
                    output_path: plan.output_path.clone(),
                }
            }
            Ok(status) => {
                warn!("Transcoder exited with {}", status);
                TranscodeOutcome::Failure {
                    reason: FailureReason::Exited,
                    exit_code: status.code(),
                    stderr_excerpt,
                }
            }
            Err(e) => {
                error!("Failed to wait for transcoder: {}", e);
                TranscodeOutcome::Failure {
                    reason: FailureReason::Exited,
                    exit_code: None,
                    stderr_excerpt: e.to_string(),
                }
            }
        }
    }

    fn command_line(&self, plan: &ExportPlan) -> Vec<String> {
        std::iter::once(self.binary.as_os_str().to_os_string())
            .chain(Self::build_args(plan, &plan.output_path))
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }
}

async fn sleep_or_pending(timeout: Option<Duration>) {
    match timeout {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending::<()>().await,
    }
}

/// Drain the child's stderr, keeping the last few lines.
///
/// Reads raw bytes so non-UTF-8 output cannot stall the pipe.
async fn collect_stderr_tail(stderr: Option<ChildStderr>) -> String {
    let Some(stderr) = stderr else {
        return String::new();
    };

    let mut reader = BufReader::new(stderr);
    let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf).trim_end().to_string();
                if line.is_empty() {
                    continue;
                }
                debug!(target: "clipmark::ffmpeg", "{}", line);
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
        }
    }

    let joined = tail.into_iter().collect::<Vec<_>>().join("\n");
    excerpt(&joined)
}

/// Keep the end of `text`, which is where ffmpeg reports the actual error
fn excerpt(text: &str) -> String {
    let count = text.chars().count();
    if count <= STDERR_EXCERPT_MAX_CHARS {
        return text.to_string();
    }
    text.chars().skip(count - STDERR_EXCERPT_MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rules::{CutValidator, ExportPlanner};

    fn plan(dir: &Path) -> ExportPlan {
        let source = dir.join("match.mkv");
        let cut = CutValidator::validate(Some(source.as_path()), Some(2_000), Some(10_000)).unwrap();
        ExportPlanner::new().plan(&cut, "clip").unwrap()
    }

    #[test]
    fn test_build_args_matches_invocation_shape() {
        let plan = plan(Path::new("/videos"));
        let args: Vec<String> = FfmpegTranscoder::build_args(&plan, &plan.output_path)
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "-y", "-i", "/videos/match.mkv", "-ss", "2.000", "-to", "10.000", "-map", "0:v:0?",
                "-map", "0:a:0?", "-c:v", "libx264", "-preset", "veryfast", "-crf", "20",
                "-pix_fmt", "yuv420p", "-c:a", "aac", "-b:a", "160k", "/videos/clip.mp4",
            ]
        );
    }

    #[test]
    fn test_command_line_starts_with_binary() {
        let plan = plan(Path::new("/videos"));
        let line = FfmpegTranscoder::new("/opt/ffmpeg/bin/ffmpeg").command_line(&plan);
        assert_eq!(line[0], "/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(line.last().map(String::as_str), Some("/videos/clip.mp4"));
    }

    #[test]
    fn test_excerpt_keeps_tail() {
        let long = "x".repeat(STDERR_EXCERPT_MAX_CHARS) + "END";
        let cut = excerpt(&long);
        assert_eq!(cut.chars().count(), STDERR_EXCERPT_MAX_CHARS);
        assert!(cut.ends_with("END"));
        assert_eq!(excerpt("short"), "short");
    }

    #[cfg(unix)]
    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_zero_exit_is_success() {
        let dir = tempfile::tempdir().unwrap();
        let plan = plan(dir.path());
        let outcome = FfmpegTranscoder::new("true").run(&plan, Cancellation::never()).await;
        assert_eq!(
            outcome,
            TranscodeOutcome::Success {
                output_path: plan.output_path.clone()
            }
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_keeps_stderr_tail() {
        let dir = tempfile::tempdir().unwrap();
        let bin = script(dir.path(), "ffmpeg", "echo 'first line' >&2\necho 'Invalid data found' >&2\nexit 3");
        let outcome = FfmpegTranscoder::new(bin).run(&plan(dir.path()), Cancellation::never()).await;
        match outcome {
            TranscodeOutcome::Failure {
                reason,
                exit_code,
                stderr_excerpt,
            } => {
                assert_eq!(reason, FailureReason::Exited);
                assert_eq!(exit_code, Some(3));
                assert!(stderr_excerpt.ends_with("Invalid data found"));
                assert!(stderr_excerpt.contains("first line"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_kills_child() {
        let dir = tempfile::tempdir().unwrap();
        let bin = script(dir.path(), "ffmpeg", "exec sleep 30");
        let (tx, cancel) = Cancellation::pair();
        let transcoder = FfmpegTranscoder::new(bin);
        let plan = plan(dir.path());

        let run = transcoder.run(&plan, cancel);
        let cancel_soon = async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            tx.send(()).unwrap();
        };
        let (outcome, _) = tokio::time::timeout(Duration::from_secs(10), async {
            tokio::join!(run, cancel_soon)
        })
        .await
        .expect("cancel should stop the transcoder");
        assert_eq!(outcome, TranscodeOutcome::cancelled());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_child() {
        let dir = tempfile::tempdir().unwrap();
        let bin = script(dir.path(), "ffmpeg", "exec sleep 30");
        let transcoder = FfmpegTranscoder::new(bin).with_timeout(Some(Duration::from_millis(200)));
        let outcome = tokio::time::timeout(
            Duration::from_secs(10),
            transcoder.run(&plan(dir.path()), Cancellation::never()),
        )
        .await
        .expect("timeout should stop the transcoder");
        match outcome {
            TranscodeOutcome::Failure { reason, .. } => {
                assert_eq!(reason, FailureReason::TimedOut { after_secs: 0 })
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_atomic_output_renames_on_success() {
        let dir = tempfile::tempdir().unwrap();
        // writes its last argument, like ffmpeg writing the output file
        let bin = script(dir.path(), "ffmpeg", "for last; do :; done\necho clip > \"$last\"");
        let plan = plan(dir.path());
        let outcome = FfmpegTranscoder::new(bin)
            .with_atomic_output(true)
            .run(&plan, Cancellation::never())
            .await;
        assert!(outcome.is_success());
        assert_eq!(std::fs::read_to_string(&plan.output_path).unwrap(), "clip\n");
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".partial-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_atomic_output_discarded_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let bin = script(dir.path(), "ffmpeg", "for last; do :; done\necho partial > \"$last\"\nexit 1");
        let plan = plan(dir.path());
        let outcome = FfmpegTranscoder::new(bin)
            .with_atomic_output(true)
            .run(&plan, Cancellation::never())
            .await;
        assert!(!outcome.is_success());
        assert!(!plan.output_path.exists());
        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["ffmpeg".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_binary_is_launch_failure() {
        let dir = tempfile::tempdir().unwrap();
        let transcoder = FfmpegTranscoder::new(dir.path().join("no-such-ffmpeg"));
        let outcome = transcoder.run(&plan(dir.path()), Cancellation::never()).await;
        match outcome {
            TranscodeOutcome::Failure { reason, exit_code, .. } => {
                assert_eq!(reason, FailureReason::Launch);
                assert_eq!(exit_code, None);
            }
            other => panic!("expected launch failure, got {:?}", other),
        }
    }
}
