// Post-export workflow - Optional replace-original sequencing after a transcode

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Where the workflow ended up, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStage {
    Exported,
    DeletingOriginal,
    Failed,
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowStage::Exported => "exported",
            WorkflowStage::DeletingOriginal => "deleting-original",
            WorkflowStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Sequences reopen and source deletion after a transcode finishes
#[derive(Clone)]
pub struct PostExportWorkflow {
    fs_port: Arc<dyn FsPort>,
}

impl PostExportWorkflow {
    pub fn new(fs_port: Arc<dyn FsPort>) -> Self {
        Self { fs_port }
    }

    /// Turn a transcode outcome into the user-facing result.
    ///
    /// With `delete_original`, the clip is reopened through `reopen` first and
    /// the source is removed only once that succeeded. A failed outcome has no
    /// side effects.
    pub async fn run<F>(
        &self,
        outcome: TranscodeOutcome,
        plan: &ExportPlan,
        delete_original: bool,
        source_path: &Path,
        reopen: F,
    ) -> WorkflowResult
    where
        F: FnOnce(&Path) -> Result<(), DomainError>,
    {
        let output_path = match outcome {
            TranscodeOutcome::Success { output_path } => output_path,
            failure => {
                let reason = failure
                    .error()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "unknown failure".to_string());
                warn!(stage = %WorkflowStage::Failed, output = %plan.output_path.display(), "{}", reason);
                return WorkflowResult::Failure { reason };
            }
        };

        if !delete_original {
            info!(stage = %WorkflowStage::Exported, "Saved {}", output_path.display());
            return WorkflowResult::Success {
                output_path,
                original_deleted: false,
            };
        }

        info!(
            stage = %WorkflowStage::DeletingOriginal,
            "Reopening {} before removing {}",
            output_path.display(),
            source_path.display()
        );

        // The source must stay on disk until the clip is confirmed usable
        if let Err(e) = reopen(&output_path) {
            let error = DomainError::ReopenFailure(e.to_string()).to_string();
            warn!(stage = %WorkflowStage::DeletingOriginal, "{}; original kept", error);
            return WorkflowResult::SuccessWithDeleteFailure { output_path, error };
        }

        match self.fs_port.remove_file(source_path).await {
            Ok(()) => {
                info!(stage = %WorkflowStage::DeletingOriginal, "Deleted {}", source_path.display());
                WorkflowResult::Success {
                    output_path,
                    original_deleted: true,
                }
            }
            Err(e) => {
                let error = DomainError::DeleteFailure(format!("{}: {}", source_path.display(), e)).to_string();
                warn!(stage = %WorkflowStage::DeletingOriginal, "{}", error);
                WorkflowResult::SuccessWithDeleteFailure { output_path, error }
            }
        }
    }
}
