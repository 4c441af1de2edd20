use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `clipmark` isolated from the caller's environment and any config in the cwd
fn clipmark(cwd: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("clipmark").unwrap();
    cmd.current_dir(cwd.path())
        .env_remove("CLIPMARK_CONFIG")
        .env_remove("CLIPMARK_FFMPEG")
        .env_remove("CLIPMARK_FFPROBE")
        .env_remove("CLIPMARK_LOG_LEVEL")
        .env_remove("CLIPMARK_TRANSCODE_TIMEOUT")
        .env_remove("CLIPMARK_ATOMIC_OUTPUT")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_plan_prints_ffmpeg_command() {
    let cwd = TempDir::new().unwrap();
    clipmark(&cwd)
        .args(["plan", "-i", "/videos/match.mkv", "-s", "2", "-e", "00:10", "-n", "goal"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "ffmpeg -y -i /videos/match.mkv -ss 2.000 -to 10.000 -map 0:v:0? -map 0:a:0?",
        ))
        .stdout(predicate::str::contains(
            "-c:v libx264 -preset veryfast -crf 20 -pix_fmt yuv420p -c:a aac -b:a 160k /videos/goal.mp4",
        ));
}

#[test]
fn test_plan_default_name_and_json() {
    let cwd = TempDir::new().unwrap();
    let output = clipmark(&cwd)
        .args([
            "--ffmpeg",
            "/opt/ffmpeg/bin/ffmpeg",
            "plan",
            "-i",
            "/videos/match.mkv",
            "-s",
            "1.5",
            "-e",
            "3",
            "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["plan"]["output_path"], "/videos/CUT_match.mp4");
    assert_eq!(report["plan"]["start_seconds"], "1.500");
    assert_eq!(report["command"][0], "/opt/ffmpeg/bin/ffmpeg");
}

#[test]
fn test_plan_invalid_range_fails() {
    let cwd = TempDir::new().unwrap();
    clipmark(&cwd)
        .args(["plan", "-i", "/videos/match.mkv", "-s", "10", "-e", "2"])
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Invalid range"));
}

#[test]
fn test_plan_rejects_bad_time_and_name() {
    let cwd = TempDir::new().unwrap();
    clipmark(&cwd)
        .args(["plan", "-i", "/videos/match.mkv", "-s", "later", "-e", "2"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid time format"));

    clipmark(&cwd)
        .args(["plan", "-i", "/videos/match.mkv", "-s", "1", "-e", "2", "-n", "../escape"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid output name"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let cwd = TempDir::new().unwrap();
    clipmark(&cwd)
        .args(["--config", "nope.toml", "plan", "-i", "a.mkv", "-s", "1", "-e", "2"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_config_file_in_cwd_is_used() {
    let cwd = TempDir::new().unwrap();
    std::fs::write(
        cwd.path().join("clipmark.toml"),
        "[transcoder]\nbinary = \"/from/config/ffmpeg\"\n",
    )
    .unwrap();
    clipmark(&cwd)
        .args(["plan", "-i", "/videos/a.mkv", "-s", "1", "-e", "2"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("/from/config/ffmpeg -y"));
}

#[test]
fn test_export_missing_source_fails() {
    let cwd = TempDir::new().unwrap();
    clipmark(&cwd)
        .args(["export", "-i", "missing.mkv", "-s", "1", "-e", "2", "--duration", "60"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Source unavailable"));
}

#[test]
fn test_session_reports_errors_and_continues() {
    let cwd = TempDir::new().unwrap();
    clipmark(&cwd)
        .arg("session")
        .write_stdin("status\nexport clip\nrewind\nmark\nswap\nstatus\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("source=- time=- start=- end=- active=Start exporting=no"))
        .stdout(predicate::str::contains("error: No source loaded"))
        .stdout(predicate::str::contains("error: Invalid command: unknown command 'rewind'"))
        .stdout(predicate::str::contains("markers start=0.000 end=0.000"))
        .stdout(predicate::str::contains("active End"))
        .stdout(predicate::str::contains("end=0.000 active=End"));
}

#[cfg(unix)]
mod with_fake_ffmpeg {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    struct Fixture {
        dir: TempDir,
        source: PathBuf,
        ffprobe: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("match.mkv");
        std::fs::write(&source, b"source video").unwrap();
        let ffprobe = script(dir.path(), "ffprobe", "echo 60.000000");
        Fixture { dir, source, ffprobe }
    }

    #[test]
    fn test_export_and_delete_original() {
        let fx = fixture();
        let ffmpeg = script(fx.dir.path(), "ffmpeg", "for last; do :; done\necho clip > \"$last\"");

        clipmark(&fx.dir)
            .arg("--ffmpeg")
            .arg(&ffmpeg)
            .arg("--ffprobe")
            .arg(&fx.ffprobe)
            .arg("export")
            .arg("-i")
            .arg(&fx.source)
            .args(["-s", "2", "-e", "10", "-n", "goal", "--delete-original"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Original deleted"));

        assert!(fx.dir.path().join("goal.mp4").is_file());
        assert!(!fx.source.exists());
    }

    #[test]
    fn test_export_failure_keeps_source() {
        let fx = fixture();
        let ffmpeg = script(fx.dir.path(), "ffmpeg", "echo 'Invalid data found' >&2\nexit 1");

        clipmark(&fx.dir)
            .arg("--ffmpeg")
            .arg(&ffmpeg)
            .arg("--ffprobe")
            .arg(&fx.ffprobe)
            .arg("export")
            .arg("-i")
            .arg(&fx.source)
            .args(["-s", "2", "-e", "10", "--delete-original", "--json"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("\"status\": \"failure\""))
            .stdout(predicate::str::contains("Invalid data found"));

        assert!(fx.source.is_file());
    }

    #[test]
    fn test_session_export_runs_in_background() {
        let fx = fixture();
        let ffmpeg = script(fx.dir.path(), "ffmpeg", "for last; do :; done\necho clip > \"$last\"");

        clipmark(&fx.dir)
            .arg("--ffmpeg")
            .arg(&ffmpeg)
            .arg("--ffprobe")
            .arg(&fx.ffprobe)
            .arg("session")
            .arg("--input")
            .arg(&fx.source)
            .write_stdin("seek 2\nmark\nswap\nseek 10\nmark\nexport best\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("markers start=2.000 end=59.900"))
            .stdout(predicate::str::contains("markers start=2.000 end=10.000"))
            .stdout(predicate::str::contains("Export complete. Saved:"));

        assert!(fx.dir.path().join("best.mp4").is_file());
        assert!(fx.source.is_file());
    }
}
