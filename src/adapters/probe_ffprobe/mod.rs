//! FFprobe adapter for media duration probing
//!
//! Asks `ffprobe` for the container duration only; stream details are not
//! needed to drive the timeline.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::debug;

use crate::domain::errors::*;
use crate::ports::*;

#[cfg(target_os = "windows")]
const CREATE_NO_WINDOW: u32 = 0x08000000;

/// FFprobe-based probe adapter
#[derive(Debug, Clone)]
pub struct FFprobeAdapter {
    binary: PathBuf,
}

impl FFprobeAdapter {
    /// Create adapter for the given ffprobe binary (a bare name is looked up on PATH)
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self, path: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .stdin(Stdio::null());
        #[cfg(target_os = "windows")]
        {
            use std::os::windows::process::CommandExt;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }
        cmd
    }
}

/// Run `f` without stalling other tasks on a multi-threaded runtime worker
fn run_blocking<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

impl Default for FFprobeAdapter {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl ProbePort for FFprobeAdapter {
    fn probe_duration_ms(&self, path: &Path) -> Result<u64, DomainError> {
        let output = run_blocking(|| self.command(path).output()).map_err(|e| {
            DomainError::ProbeFailure(format!("cannot run {}: {}", self.binary.display(), e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DomainError::ProbeFailure(format!(
                "{} exited with {}: {}",
                self.binary.display(),
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let duration_ms = parse_duration_output(&stdout)?;
        debug!("Probed {}: {} ms", path.display(), duration_ms);
        Ok(duration_ms)
    }
}

/// Parse ffprobe's bare `format=duration` value (seconds) into milliseconds
pub fn parse_duration_output(output: &str) -> Result<u64, DomainError> {
    let value = output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| DomainError::ProbeFailure("ffprobe reported no duration".to_string()))?;

    let seconds: f64 = value
        .parse()
        .map_err(|_| DomainError::ProbeFailure(format!("unreadable duration '{}'", value)))?;

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(DomainError::ProbeFailure(format!("unreadable duration '{}'", value)));
    }

    Ok((seconds * 1000.0).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_output() {
        assert_eq!(parse_duration_output("12.345000\n").unwrap(), 12_345);
        assert_eq!(parse_duration_output("\n  3600.0004 \n").unwrap(), 3_600_000);
        assert_eq!(parse_duration_output("0.0005").unwrap(), 1);
    }

    #[test]
    fn test_parse_duration_rejects_unknown() {
        assert!(matches!(
            parse_duration_output("N/A"),
            Err(DomainError::ProbeFailure(_))
        ));
        assert!(parse_duration_output("").is_err());
        assert!(parse_duration_output("-1.0").is_err());
    }

    #[test]
    fn test_missing_binary_is_probe_failure() {
        let dir = tempfile::tempdir().unwrap();
        let probe = FFprobeAdapter::new(dir.path().join("no-such-ffprobe"));
        let err = probe.probe_duration_ms(&dir.path().join("a.mp4")).unwrap_err();
        assert!(matches!(err, DomainError::ProbeFailure(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_duration_lookup_inside_multi_thread_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let probe = FFprobeAdapter::new(dir.path().join("no-such-ffprobe"));
        let err = probe.probe_duration_ms(&dir.path().join("a.mp4")).unwrap_err();
        assert!(matches!(err, DomainError::ProbeFailure(_)));
    }

    #[tokio::test]
    async fn test_duration_lookup_inside_current_thread_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let probe = FFprobeAdapter::new(dir.path().join("no-such-ffprobe"));
        assert!(probe.probe_duration_ms(&dir.path().join("a.mp4")).is_err());
    }
}
