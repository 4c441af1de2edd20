// TOML config adapter - Configuration loaded from TOML files and the environment

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::errors::*;
use crate::utils::logging::{LogLevel, LoggingConfig};

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "CLIPMARK_CONFIG";

/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "clipmark.toml";

/// Transcoder settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscoderConfig {
    /// ffmpeg binary, bare name or path
    pub binary: PathBuf,
    /// Kill the transcoder after this many seconds; unset means no limit
    pub timeout_secs: Option<u64>,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("ffmpeg"),
            timeout_secs: None,
        }
    }
}

impl TranscoderConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Duration probe settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub binary: PathBuf,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("ffprobe"),
        }
    }
}

/// Output file handling
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Write through a temporary sibling and rename on success
    pub atomic: bool,
}

/// Playhead nudge steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NudgeConfig {
    pub small_ms: u64,
    pub large_ms: u64,
}

impl Default for NudgeConfig {
    fn default() -> Self {
        Self {
            small_ms: 100,
            large_ms: 1_000,
        }
    }
}

/// Full application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub transcoder: TranscoderConfig,
    pub probe: ProbeConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
    pub nudge: NudgeConfig,
}

impl AppConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, DomainError> {
        toml::from_str(content)
            .map_err(|e| DomainError::Config(format!("Failed to parse TOML config: {}", e)))
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, DomainError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply `CLIPMARK_*` overrides. `lookup` is `std::env::var` in production.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<usize, DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut applied = 0;

        if let Some(value) = lookup("CLIPMARK_FFMPEG") {
            self.transcoder.binary = PathBuf::from(value);
            applied += 1;
        }
        if let Some(value) = lookup("CLIPMARK_FFPROBE") {
            self.probe.binary = PathBuf::from(value);
            applied += 1;
        }
        if let Some(value) = lookup("CLIPMARK_LOG_LEVEL") {
            self.logging.level = LogLevel::parse(&value)?;
            applied += 1;
        }
        if let Some(value) = lookup("CLIPMARK_TRANSCODE_TIMEOUT") {
            let secs = value.trim().parse::<u64>().map_err(|_| {
                DomainError::Config(format!(
                    "CLIPMARK_TRANSCODE_TIMEOUT must be a whole number of seconds, got '{}'",
                    value
                ))
            })?;
            self.transcoder.timeout_secs = Some(secs);
            applied += 1;
        }
        if let Some(value) = lookup("CLIPMARK_ATOMIC_OUTPUT") {
            self.output.atomic = parse_flag("CLIPMARK_ATOMIC_OUTPUT", &value)?;
            applied += 1;
        }

        if applied > 0 {
            debug!("Applied {} environment overrides", applied);
        }
        Ok(applied)
    }

    /// Reject values no component can work with
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.transcoder.timeout_secs == Some(0) {
            return Err(DomainError::Config(
                "transcoder.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.transcoder.binary.as_os_str().is_empty() {
            return Err(DomainError::Config("transcoder.binary cannot be empty".to_string()));
        }
        if self.probe.binary.as_os_str().is_empty() {
            return Err(DomainError::Config("probe.binary cannot be empty".to_string()));
        }
        if self.nudge.small_ms == 0 || self.nudge.large_ms == 0 {
            return Err(DomainError::Config("nudge steps must be greater than zero".to_string()));
        }
        Ok(())
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, DomainError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(DomainError::Config(format!(
            "{} must be true or false, got '{}'",
            name, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.transcoder.binary, PathBuf::from("ffmpeg"));
        assert_eq!(config.transcoder.timeout(), None);
        assert_eq!(config.probe.binary, PathBuf::from("ffprobe"));
        assert!(!config.output.atomic);
        assert_eq!(config.nudge.small_ms, 100);
        assert_eq!(config.nudge.large_ms, 1_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            "[transcoder]\ntimeout_secs = 600\n\n[logging]\nlevel = \"warn\"\n",
        )
        .unwrap();
        assert_eq!(config.transcoder.binary, PathBuf::from("ffmpeg"));
        assert_eq!(config.transcoder.timeout(), Some(Duration::from_secs(600)));
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert_eq!(config.nudge, NudgeConfig::default());
    }

    #[test]
    fn test_bad_level_in_file_is_error() {
        let err = AppConfig::from_toml_str("[logging]\nlevel = \"chatty\"\n").unwrap_err();
        assert!(matches!(err, DomainError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[output]\natomic = true\n").unwrap();
        let config = AppConfig::load(&path).unwrap();
        assert!(config.output.atomic);

        assert!(AppConfig::load(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        let applied = config
            .apply_env(env(&[
                ("CLIPMARK_FFMPEG", "/opt/ffmpeg"),
                ("CLIPMARK_LOG_LEVEL", "debug"),
                ("CLIPMARK_TRANSCODE_TIMEOUT", "30"),
                ("CLIPMARK_ATOMIC_OUTPUT", "yes"),
            ]))
            .unwrap();
        assert_eq!(applied, 4);
        assert_eq!(config.transcoder.binary, PathBuf::from("/opt/ffmpeg"));
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.transcoder.timeout_secs, Some(30));
        assert!(config.output.atomic);
    }

    #[test]
    fn test_env_rejects_garbage() {
        let mut config = AppConfig::default();
        assert!(config.apply_env(env(&[("CLIPMARK_TRANSCODE_TIMEOUT", "soon")])).is_err());
        assert!(config.apply_env(env(&[("CLIPMARK_ATOMIC_OUTPUT", "maybe")])).is_err());
        assert!(config.apply_env(env(&[("CLIPMARK_LOG_LEVEL", "loud")])).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = AppConfig::default();
        config.transcoder.timeout_secs = Some(0);
        assert!(config.validate().is_err());
    }
}
