//! RunRequest - inventory スナップショットに対する 1 回の実行パス

use tracing::{debug, info, warn};

use super::groups::GroupIndex;
use super::retry::FailureDisposition;
use crate::domain::{QueueTask, StorageId};
use crate::ports::{StorageError, TaskStore};
use crate::typed::{Dispatch, RunnerRegistry};

/// What one pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Tasks a runner accepted.
    pub attempted: usize,
    pub succeeded: usize,
    /// Tasks kept for a later pass after a retryable failure.
    pub retried: usize,
    /// Tasks deleted without success: permanent failures, missing or corrupt bodies.
    pub dropped: usize,
    /// Tasks kept because their body could not be read this pass.
    pub unreadable: usize,
    pub skipped_blocked: usize,
    /// Tasks no runner accepted.
    pub unhandled: usize,
    /// The pass ended early on a halting failure.
    pub halted: bool,
}

/// Walks the inventory snapshot in creation order and runs every eligible task.
///
/// Flow per task:
/// 1. skip when group-blocked (judged against the pass-start snapshot)
/// 2. load the body; a missing or corrupt body is deleted, a failed read
///    leaves the task for the next pass
/// 3. dispatch to the runner registry
/// 4. success / drop → delete; retry → count the run and keep
pub(crate) struct RunRequest<'a> {
    pub(crate) queue_id: &'a str,
    pub(crate) storage: &'a dyn TaskStore,
    pub(crate) runners: &'a RunnerRegistry,
}

impl RunRequest<'_> {
    pub(crate) async fn start(self) -> RunSummary {
        let inventory = self.storage.inventory().await;
        let mut summary = RunSummary::default();
        if inventory.is_empty() {
            debug!(queue_id = self.queue_id, "queue empty, nothing to run");
            return summary;
        }

        let groups = GroupIndex::from_inventory(&inventory);

        for meta in &inventory {
            let storage_id = meta.task_persisted_id;

            if groups.is_blocked(meta) {
                debug!(
                    %storage_id,
                    blocked_by = ?groups.blocking_anchors(meta),
                    "task waiting on its group"
                );
                summary.skipped_blocked += 1;
                continue;
            }

            let task = match self.storage.get(storage_id).await {
                Ok(Some(task)) => task,
                Ok(None) => {
                    warn!(%storage_id, task_type = %meta.task_type, "task body missing, removing from inventory");
                    self.delete(storage_id).await;
                    summary.dropped += 1;
                    continue;
                }
                Err(e @ StorageError::Serialization { .. }) => {
                    warn!(%storage_id, task_type = %meta.task_type, error = %e, "task body corrupt, removing from inventory");
                    self.delete(storage_id).await;
                    summary.dropped += 1;
                    continue;
                }
                Err(e) => {
                    warn!(%storage_id, task_type = %meta.task_type, error = %e, "could not read task body, leaving it queued");
                    summary.unreadable += 1;
                    continue;
                }
            };

            match self.runners.dispatch(&task).await {
                Dispatch::Unhandled => {
                    warn!(%storage_id, task_type = %task.task_type, "no runner accepted task, leaving it queued");
                    summary.unhandled += 1;
                }
                Dispatch::Succeeded => {
                    summary.attempted += 1;
                    summary.succeeded += 1;
                    debug!(%storage_id, task_type = %task.task_type, "task succeeded");
                    self.delete(storage_id).await;
                }
                Dispatch::Failed { error, disposition } => {
                    summary.attempted += 1;
                    match disposition {
                        FailureDisposition::Drop => {
                            warn!(%storage_id, task_type = %task.task_type, %error, "task failed permanently, dropping");
                            summary.dropped += 1;
                            self.delete(storage_id).await;
                        }
                        FailureDisposition::Retry => {
                            summary.retried += 1;
                            self.record_failed_run(&task, &error.to_string()).await;
                        }
                        FailureDisposition::RetryAndHalt => {
                            summary.retried += 1;
                            self.record_failed_run(&task, &error.to_string()).await;
                            info!(%storage_id, %error, "halting queue run");
                            summary.halted = true;
                            break;
                        }
                    }
                }
            }
        }

        info!(
            queue_id = self.queue_id,
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            retried = summary.retried,
            dropped = summary.dropped,
            unreadable = summary.unreadable,
            skipped_blocked = summary.skipped_blocked,
            unhandled = summary.unhandled,
            halted = summary.halted,
            "queue run finished"
        );
        summary
    }

    async fn delete(&self, storage_id: StorageId) {
        if let Err(e) = self.storage.delete(storage_id).await {
            warn!(%storage_id, error = %e, "could not delete task; it will be seen again next run");
        }
    }

    async fn record_failed_run(&self, task: &QueueTask, error: &str) {
        let run_results = task.run_results.record_failed_run();
        debug!(
            storage_id = %task.storage_id,
            task_type = %task.task_type,
            total_runs = run_results.total_runs,
            error,
            "task failed, will retry"
        );
        if let Err(e) = self.storage.update(task.storage_id, run_results).await {
            warn!(storage_id = %task.storage_id, error = %e, "could not record failed run");
        }
    }
}
