//! RunnerRegistry - runner の登録と dispatch
//!
//! # 学習ポイント
//! - 型消去された trait object（`Arc<dyn QueueRunner>`）の管理
//! - HashSet で task_type の重複登録を検出
//! - 登録順を Vec で保持（dispatch 順序を決定的にする）
//! - Arc による共有所有権

use std::collections::HashSet;
use std::sync::Arc;

use super::handler::{Handler, TypedRunner};
use super::task::TaskPayload;
use crate::domain::{QueueTask, RunError, TaskType};
use crate::queue::FailureDisposition;
use crate::runner::QueueRunner;

/// RegistryError は RunnerRegistry の操作エラー
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("a runner for task type '{0}' is already registered")]
    AlreadyRegistered(TaskType),
}

/// Result of offering one task to the registered runners.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// No runner accepted the task.
    Unhandled,
    Succeeded,
    Failed {
        error: RunError,
        disposition: FailureDisposition,
    },
}

/// Runners keyed by the task types they claim.
///
/// Built at start-up (mutable), read-only once the queue runs. Each task
/// type is claimed by at most one runner.
#[derive(Default)]
pub struct RunnerRegistry {
    runners: Vec<(Vec<TaskType>, Arc<dyn QueueRunner>)>,
    claimed: HashSet<TaskType>,
}

impl RunnerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `runner` for every type in `task_types`.
    ///
    /// Nothing is registered when one of the types is already claimed.
    pub fn register(
        &mut self,
        task_types: impl IntoIterator<Item = TaskType>,
        runner: Arc<dyn QueueRunner>,
    ) -> Result<(), RegistryError> {
        let mut claimed: Vec<TaskType> = Vec::new();
        for task_type in task_types {
            if self.claimed.contains(&task_type) || claimed.contains(&task_type) {
                return Err(RegistryError::AlreadyRegistered(task_type));
            }
            claimed.push(task_type);
        }

        self.claimed.extend(claimed.iter().cloned());
        self.runners.push((claimed, runner));
        Ok(())
    }

    /// Register a typed handler under `T::TYPE`.
    pub fn register_handler<T: TaskPayload, H: Handler<T> + 'static>(
        &mut self,
        handler: H,
    ) -> Result<(), RegistryError> {
        self.register([T::task_type()], Arc::new(TypedRunner::new(handler)))
    }

    pub fn registered_types(&self) -> Vec<TaskType> {
        self.runners
            .iter()
            .flat_map(|(types, _)| types.iter().cloned())
            .collect()
    }

    /// Offer `task` to the runners claiming its type, in registration order,
    /// until one accepts it.
    pub async fn dispatch(&self, task: &QueueTask) -> Dispatch {
        let candidates = self
            .runners
            .iter()
            .filter(|(types, _)| types.contains(&task.task_type));

        for (_, runner) in candidates {
            match runner.run_task(task).await {
                None => continue,
                Some(Ok(())) => return Dispatch::Succeeded,
                Some(Err(error)) => {
                    let disposition = runner.classify(&error);
                    return Dispatch::Failed { error, disposition };
                }
            }
        }
        Dispatch::Unhandled
    }
}
