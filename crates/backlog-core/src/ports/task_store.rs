//! TaskStore port - pending task の正本（source of truth）
//!
//! TaskStore は以下を管理します：
//! - task body（storage id ごとの blob）
//! - inventory（全 pending task の metadata、作成順）
//!
//! # 設計原則
//! - 書き込みは store 単位の 1 つのロックで直列化
//! - inventory の更新に失敗したら in-memory 側も変更しない

use async_trait::async_trait;

use crate::domain::{QueueTask, QueueTaskGroup, QueueTaskMetadata, QueueTaskRunResults, StorageId, TaskType};
use crate::ports::key_value::StorageError;

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persist a new task and append its metadata to the inventory.
    async fn create(
        &self,
        task_type: TaskType,
        data: Vec<u8>,
        group_start: Option<QueueTaskGroup>,
        blocking_groups: &[QueueTaskGroup],
    ) -> Result<QueueTaskMetadata, StorageError>;

    /// Load a task body.
    ///
    /// A missing body is `Ok(None)`. A body that does not parse is
    /// `StorageError::Serialization`; any other error means the read itself
    /// failed and the body may still be intact.
    async fn get(&self, storage_id: StorageId) -> Result<Option<QueueTask>, StorageError>;

    /// Rewrite the run history of a stored task.
    async fn update(
        &self,
        storage_id: StorageId,
        run_results: QueueTaskRunResults,
    ) -> Result<(), StorageError>;

    /// Remove a task. Deleting an unknown id succeeds.
    async fn delete(&self, storage_id: StorageId) -> Result<(), StorageError>;

    /// Snapshot of the inventory in creation order.
    async fn inventory(&self) -> Vec<QueueTaskMetadata>;
}
