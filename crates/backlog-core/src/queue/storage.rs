//! QueueStorage - key/value store 上の task body と inventory
//!
//! # 学習ポイント
//! - inventory は 1 つの tokio Mutex で保護し、I/O の間も保持する
//! - 書き込み成功後にだけ in-memory の inventory を更新する

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use crate::domain::{
    QueueTask, QueueTaskGroup, QueueTaskMetadata, QueueTaskRunResults, StorageId, TaskType,
};
use crate::ports::{Clock, IdGenerator, KeyValueStore, StorageError, TaskStore};

const INVENTORY_KEY: &str = "inventory.json";
const CORRUPT_INVENTORY_KEY: &str = "inventory.json.corrupt";

fn task_key(storage_id: StorageId) -> String {
    format!("tasks/{storage_id}.json")
}

/// Exclusive owner of the on-disk queue state.
///
/// Layout under the key/value root:
/// - `inventory.json`: every pending task's metadata, in creation order
/// - `tasks/{storage_id}.json`: one body per task
///
/// The inventory lives in memory behind a single lock. Every mutation holds
/// that lock across its I/O, and the in-memory copy only changes after the
/// new inventory has been written.
pub struct QueueStorage {
    kv: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    inventory: Mutex<Vec<QueueTaskMetadata>>,
}

impl QueueStorage {
    /// Load the inventory from `kv`.
    ///
    /// An unreadable inventory is copied to `inventory.json.corrupt` and
    /// replaced by an empty one; an I/O failure is returned.
    pub async fn open(
        kv: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<Self, StorageError> {
        let inventory = match kv.read(INVENTORY_KEY).await? {
            None => Vec::new(),
            Some(bytes) => match serde_json::from_slice::<Vec<QueueTaskMetadata>>(&bytes) {
                Ok(inventory) => inventory,
                Err(e) => {
                    error!(error = %e, "queue inventory unreadable, starting with an empty backlog");
                    if let Err(e) = kv.write(CORRUPT_INVENTORY_KEY, &bytes).await {
                        warn!(error = %e, "could not keep a copy of the unreadable inventory");
                    }
                    Vec::new()
                }
            },
        };
        debug!(pending = inventory.len(), "queue inventory loaded");

        Ok(Self {
            kv,
            clock,
            ids,
            inventory: Mutex::new(inventory),
        })
    }

    async fn write_inventory(&self, inventory: &[QueueTaskMetadata]) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(inventory).map_err(|source| StorageError::Serialization {
            key: INVENTORY_KEY.to_string(),
            source,
        })?;
        self.kv.write(INVENTORY_KEY, &bytes).await
    }

    async fn read_task(&self, storage_id: StorageId) -> Result<Option<QueueTask>, StorageError> {
        let key = task_key(storage_id);
        let Some(bytes) = self.kv.read(&key).await? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StorageError::Serialization { key, source })
    }

    async fn write_task(&self, task: &QueueTask) -> Result<(), StorageError> {
        let key = task_key(task.storage_id);
        let bytes = serde_json::to_vec(task).map_err(|source| StorageError::Serialization {
            key: key.clone(),
            source,
        })?;
        self.kv.write(&key, &bytes).await
    }
}

#[async_trait]
impl TaskStore for QueueStorage {
    async fn create(
        &self,
        task_type: TaskType,
        data: Vec<u8>,
        group_start: Option<QueueTaskGroup>,
        blocking_groups: &[QueueTaskGroup],
    ) -> Result<QueueTaskMetadata, StorageError> {
        let mut inventory = self.inventory.lock().await;

        let storage_id = self.ids.generate_storage_id();
        let metadata = QueueTaskMetadata::new(
            storage_id,
            task_type.clone(),
            group_start.as_ref(),
            blocking_groups,
            self.clock.now(),
        );
        let task = QueueTask {
            storage_id,
            task_type,
            data,
            run_results: QueueTaskRunResults::default(),
        };

        self.write_task(&task).await?;

        let mut next = inventory.clone();
        next.push(metadata.clone());
        if let Err(e) = self.write_inventory(&next).await {
            // orphaned body; harmless but wasteful
            if let Err(cleanup) = self.kv.remove(&task_key(storage_id)).await {
                warn!(%storage_id, error = %cleanup, "could not remove body of failed create");
            }
            return Err(e);
        }
        *inventory = next;

        debug!(%storage_id, task_type = %metadata.task_type, "task persisted");
        Ok(metadata)
    }

    async fn get(&self, storage_id: StorageId) -> Result<Option<QueueTask>, StorageError> {
        let _inventory = self.inventory.lock().await;
        self.read_task(storage_id).await
    }

    async fn update(
        &self,
        storage_id: StorageId,
        run_results: QueueTaskRunResults,
    ) -> Result<(), StorageError> {
        let _inventory = self.inventory.lock().await;
        let mut task = self
            .read_task(storage_id)
            .await?
            .ok_or(StorageError::TaskNotFound(storage_id))?;
        task.run_results = run_results;
        self.write_task(&task).await
    }

    async fn delete(&self, storage_id: StorageId) -> Result<(), StorageError> {
        let mut inventory = self.inventory.lock().await;

        if inventory.iter().any(|m| m.task_persisted_id == storage_id) {
            let next: Vec<QueueTaskMetadata> = inventory
                .iter()
                .filter(|m| m.task_persisted_id != storage_id)
                .cloned()
                .collect();
            self.write_inventory(&next).await?;
            *inventory = next;
        }

        // the index no longer points at the body, so a failure here only leaks a file
        if let Err(e) = self.kv.remove(&task_key(storage_id)).await {
            warn!(%storage_id, error = %e, "could not remove task body");
        }
        Ok(())
    }

    async fn inventory(&self) -> Vec<QueueTaskMetadata> {
        self.inventory.lock().await.clone()
    }
}
