// Domain rules - Cut validation and export planning

use std::path::Path;

use crate::domain::errors::DomainError;
use crate::domain::model::*;
use crate::utils::path::{has_extension_ignore_case, source_directory};
use crate::utils::time::format_seconds_ms;

/// Gatekeeper between the marker state and the export planner
pub struct CutValidator;

impl CutValidator {
    /// Check a candidate cut. Order matters: a missing source wins over
    /// missing markers, which win over a bad range.
    pub fn validate(
        source_path: Option<&Path>,
        start_ms: Option<u64>,
        end_ms: Option<u64>,
    ) -> Result<CutRequest, DomainError> {
        let source = match source_path {
            Some(path) if !path.as_os_str().is_empty() => path,
            _ => return Err(DomainError::NoSourceLoaded),
        };

        let (start_ms, end_ms) = match (start_ms, end_ms) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(DomainError::MarkersIncomplete),
        };

        if end_ms <= start_ms {
            return Err(DomainError::InvalidRange { start_ms, end_ms });
        }

        Ok(CutRequest::new(source.to_path_buf(), start_ms, end_ms))
    }
}

/// Turns a validated cut plus a user-chosen name into a transcode plan
#[derive(Debug, Clone, Default)]
pub struct ExportPlanner {
    policy: EncodingPolicy,
}

impl ExportPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the output path and time range for `request`
    pub fn plan(&self, request: &CutRequest, output_name: &str) -> Result<ExportPlan, DomainError> {
        let file_name = Self::normalize_name(output_name)?;
        let output_path = source_directory(request.source_path()).join(&file_name);

        // Output always lands beside the source; case-insensitive filesystems
        // treat `match.MP4` and `match.mp4` as one file
        let overwrites_source = request
            .source_path()
            .file_name()
            .is_some_and(|source_name| source_name.to_string_lossy().eq_ignore_ascii_case(&file_name));
        if overwrites_source {
            return Err(DomainError::InvalidName(format!(
                "'{}' would overwrite the source file",
                file_name
            )));
        }

        Ok(ExportPlan {
            input_path: request.source_path().to_path_buf(),
            output_path,
            start_seconds: format_seconds_ms(request.start_ms()),
            end_seconds: format_seconds_ms(request.end_ms()),
            video: self.policy.video.clone(),
            audio: self.policy.audio.clone(),
        })
    }

    /// Trim, reject unusable names and append the container extension once
    pub fn normalize_name(output_name: &str) -> Result<String, DomainError> {
        let name = output_name.trim();
        if name.is_empty() {
            return Err(DomainError::EmptyName);
        }
        if name == "." || name == ".." {
            return Err(DomainError::InvalidName(format!("'{}' is not a file name", name)));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(DomainError::InvalidName(format!(
                "'{}' must not contain path separators",
                name
            )));
        }

        if has_extension_ignore_case(name, OUTPUT_EXTENSION) {
            Ok(name.to_string())
        } else {
            Ok(format!("{}.{}", name, OUTPUT_EXTENSION))
        }
    }

    /// Suggested output name for a source, e.g. `CUT_match.mp4`
    pub fn default_output_name(source_path: &Path) -> String {
        let stem = source_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "clip".to_string());
        format!("CUT_{}.{}", stem, OUTPUT_EXTENSION)
    }
}
