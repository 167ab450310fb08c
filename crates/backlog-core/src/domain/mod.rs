//! Domain - ドメインモデル（ids, task_type, group, task, status, errors）

pub mod errors;
pub mod group;
pub mod ids;
pub mod status;
pub mod task;
pub mod task_type;

pub use self::errors::{HttpError, RunError};
pub use self::group::QueueTaskGroup;
pub use self::ids::StorageId;
pub use self::status::QueueStatus;
pub use self::task::{QueueTask, QueueTaskMetadata, QueueTaskRunResults};
pub use self::task_type::{QueueTaskType, TaskType};
