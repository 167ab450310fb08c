//! Task records - 永続化される task 本体と inventory の metadata
//!
//! - QueueTask: task body（`tasks/{storage_id}.json`）
//! - QueueTaskMetadata: inventory の 1 エントリ（作成順に並ぶ）

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::group::QueueTaskGroup;
use super::ids::StorageId;
use super::task_type::TaskType;

/// Run history of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueTaskRunResults {
    /// Attempts that ended in a retryable failure.
    pub total_runs: u32,
}

impl QueueTaskRunResults {
    pub fn record_failed_run(self) -> Self {
        Self {
            total_runs: self.total_runs.saturating_add(1),
        }
    }
}

/// One durable unit of deferred work.
///
/// `task_type` and `data` never change after creation; `run_results` is the
/// only field rewritten in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueTask {
    pub storage_id: StorageId,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    /// Payload as encoded by the producer; opaque to the store. Stored on
    /// disk as a string, so it must be UTF-8.
    #[serde(with = "utf8_bytes")]
    pub data: Vec<u8>,
    #[serde(default)]
    pub run_results: QueueTaskRunResults,
}

mod utf8_bytes {
    use serde::de::Error as _;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        let text = std::str::from_utf8(bytes).map_err(S::Error::custom)?;
        serializer.serialize_str(text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer).map_err(D::Error::custom)?;
        Ok(text.into_bytes())
    }
}

/// In-memory index entry for one pending task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueTaskMetadata {
    pub task_persisted_id: StorageId,
    pub task_type: TaskType,
    /// Groups this task anchors.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub groups_parent: BTreeSet<String>,
    /// Groups this task waits on.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub groups_child: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl QueueTaskMetadata {
    pub fn new(
        task_persisted_id: StorageId,
        task_type: TaskType,
        group_start: Option<&QueueTaskGroup>,
        blocking_groups: &[QueueTaskGroup],
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_persisted_id,
            task_type,
            groups_parent: group_start.map(QueueTaskGroup::key).into_iter().collect(),
            groups_child: blocking_groups.iter().map(QueueTaskGroup::key).collect(),
            created_at,
        }
    }

    /// True when this task anchors at least one group.
    pub fn is_group_anchor(&self) -> bool {
        !self.groups_parent.is_empty()
    }
}
