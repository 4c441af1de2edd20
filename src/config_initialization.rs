//! Configuration initialization and hierarchy management

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::adapters::toml_config::{AppConfig, DEFAULT_CONFIG_FILE};
use crate::cli::Cli;
use crate::error::{ClipmarkError, ClipmarkResult};
use crate::utils::logging::LogLevel;

/// Initialize configuration following precedence: CLI > Env > File > Defaults
pub fn initialize_configuration(cli: &Cli) -> ClipmarkResult<AppConfig> {
    build_configuration(cli, Path::new(DEFAULT_CONFIG_FILE), |key| std::env::var(key).ok())
}

/// Same as [`initialize_configuration`] with the fallback file and the
/// environment supplied by the caller
pub fn build_configuration<F>(cli: &Cli, fallback_file: &Path, env: F) -> ClipmarkResult<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    // Step 1: defaults, replaced by a config file when one is found
    let mut config = match config_file(cli, fallback_file)? {
        Some(path) => AppConfig::load(&path)?,
        None => {
            debug!("No configuration file, using defaults");
            AppConfig::default()
        }
    };

    // Step 2: environment
    let env_overrides = config.apply_env(env)?;

    // Step 3: command line
    let cli_overrides = apply_cli_overrides(&mut config, cli)?;

    config.validate()?;
    if env_overrides + cli_overrides > 0 {
        info!(
            "Configuration: {} environment and {} command-line overrides",
            env_overrides, cli_overrides
        );
    }
    Ok(config)
}

/// Explicit `--config`/`CLIPMARK_CONFIG` must exist; the fallback is optional
fn config_file(cli: &Cli, fallback_file: &Path) -> ClipmarkResult<Option<PathBuf>> {
    match &cli.config {
        Some(path) if path.is_file() => Ok(Some(path.clone())),
        Some(path) => Err(ClipmarkError::ConfigNotFound { path: path.clone() }),
        None if fallback_file.is_file() => Ok(Some(fallback_file.to_path_buf())),
        None => Ok(None),
    }
}

fn apply_cli_overrides(config: &mut AppConfig, cli: &Cli) -> ClipmarkResult<usize> {
    let mut applied = 0;

    if let Some(ffmpeg) = &cli.ffmpeg {
        config.transcoder.binary = ffmpeg.clone();
        applied += 1;
    }
    if let Some(ffprobe) = &cli.ffprobe {
        config.probe.binary = ffprobe.clone();
        applied += 1;
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = LogLevel::parse(level)?;
        applied += 1;
    }
    if cli.log_json {
        config.logging.json = true;
        applied += 1;
    }

    Ok(applied)
}
