//! Runner - 保存された task を backend 呼び出しに変換する
//!
//! - **QueueRunner**: coordinator が dispatch する object-safe な契約
//! - **ApiQueueRunner**: SDK 組み込み task_type 用の runner
//! - payloads: 組み込み task_type の型付き task data

pub mod api;
pub mod endpoint;
pub mod payloads;

pub use self::api::ApiQueueRunner;
pub use self::endpoint::Endpoint;

use async_trait::async_trait;

use crate::domain::{QueueTask, RunError};
use crate::queue::{FailureDisposition, FailurePolicy};

/// Module-owned logic that executes tasks of the types it knows.
#[async_trait]
pub trait QueueRunner: Send + Sync {
    /// Run `task`.
    ///
    /// Returns `None` straight away when this runner does not handle
    /// `task.task_type`; the coordinator then offers the task elsewhere.
    async fn run_task(&self, task: &QueueTask) -> Option<Result<(), RunError>>;

    /// Classify a failure this runner reported.
    fn classify(&self, error: &RunError) -> FailureDisposition {
        FailurePolicy::default().classify(error)
    }
}
