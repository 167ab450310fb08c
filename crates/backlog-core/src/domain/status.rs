use serde::{Deserialize, Serialize};

/// Snapshot of a queue's backlog. Computed from the inventory, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    pub queue_id: String,
    /// Tasks not yet run successfully, including ones waiting for a retry.
    pub num_tasks_in_queue: usize,
}

impl QueueStatus {
    pub fn new(queue_id: impl Into<String>, num_tasks_in_queue: usize) -> Self {
        Self {
            queue_id: queue_id.into(),
            num_tasks_in_queue,
        }
    }
}
