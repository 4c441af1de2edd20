// Export worker - Runs a transcode on a background task

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::domain::model::*;
use crate::ports::*;

/// Spawns transcodes off the caller's task
pub struct ExportJob;

impl ExportJob {
    /// Start `plan` on a tokio task and return a handle to cancel or await it
    pub fn spawn(transcoder: Arc<dyn TranscodePort>, plan: ExportPlan) -> ExportHandle {
        let (cancel_tx, cancel) = Cancellation::pair();
        let (done_tx, done_rx) = oneshot::channel();
        let job_plan = plan.clone();

        tokio::spawn(async move {
            let outcome = transcoder.run(&job_plan, cancel).await;
            if done_tx.send(outcome).is_err() {
                debug!("Export handle dropped before {} finished", job_plan.output_path.display());
            }
        });

        ExportHandle {
            plan,
            cancel_tx: Some(cancel_tx),
            done_rx,
        }
    }
}

/// Handle to a running export
pub struct ExportHandle {
    plan: ExportPlan,
    cancel_tx: Option<oneshot::Sender<()>>,
    done_rx: oneshot::Receiver<TranscodeOutcome>,
}

impl ExportHandle {
    pub fn plan(&self) -> &ExportPlan {
        &self.plan
    }

    /// Ask the transcoder to stop. Returns false when already requested or
    /// the job has ended.
    pub fn cancel(&mut self) -> bool {
        match self.cancel_tx.take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    /// Wait for the outcome. Safe to use inside `tokio::select!`; must not be
    /// awaited again after it has returned.
    pub async fn finished(&mut self) -> TranscodeOutcome {
        match (&mut self.done_rx).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!("Export task ended without reporting an outcome");
                TranscodeOutcome::launch_failure("export task ended unexpectedly")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rules::{CutValidator, ExportPlanner};
    use async_trait::async_trait;
    use std::path::Path;
    use std::time::Duration;

    /// Succeeds after a delay unless cancelled first
    struct SlowTranscoder(Duration);

    #[async_trait]
    impl TranscodePort for SlowTranscoder {
        async fn run(&self, plan: &ExportPlan, mut cancel: Cancellation) -> TranscodeOutcome {
            tokio::select! {
                _ = tokio::time::sleep(self.0) => TranscodeOutcome::Success {
                    output_path: plan.output_path.clone(),
                },
                _ = cancel.cancelled() => TranscodeOutcome::cancelled(),
            }
        }

        fn command_line(&self, _plan: &ExportPlan) -> Vec<String> {
            vec!["slow".to_string()]
        }
    }

    fn plan() -> ExportPlan {
        let cut = CutValidator::validate(Some(Path::new("/v/src.mkv")), Some(0), Some(1_000)).unwrap();
        ExportPlanner::new().plan(&cut, "out").unwrap()
    }

    #[tokio::test]
    async fn test_finished_delivers_outcome() {
        let mut handle = ExportJob::spawn(Arc::new(SlowTranscoder(Duration::from_millis(10))), plan());
        let outcome = handle.finished().await;
        assert!(outcome.is_success());
        assert_eq!(handle.plan().output_path, Path::new("/v/out.mp4"));
    }

    #[tokio::test]
    async fn test_cancel_yields_cancelled() {
        let mut handle = ExportJob::spawn(Arc::new(SlowTranscoder(Duration::from_secs(30))), plan());
        assert!(handle.cancel());
        assert!(!handle.cancel());
        let outcome = tokio::time::timeout(Duration::from_secs(5), handle.finished())
            .await
            .expect("cancelled job should finish promptly");
        assert_eq!(outcome, TranscodeOutcome::cancelled());
    }
}
