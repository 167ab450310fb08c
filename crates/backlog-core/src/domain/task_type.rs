use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag that routes a stored task to the runner that knows how to execute it.
///
/// Kept as a free-form string so task types owned by other modules survive
/// a round trip through the store even when this crate does not know them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskType(String);

impl TaskType {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TaskType {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TaskType {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Task types executed by the built-in API runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueTaskType {
    IdentifyProfile,
    TrackEvent,
    RegisterPushToken,
    DeletePushToken,
    TrackPushMetric,
    TrackDeliveryEvent,
}

impl QueueTaskType {
    pub const ALL: [QueueTaskType; 6] = [
        QueueTaskType::IdentifyProfile,
        QueueTaskType::TrackEvent,
        QueueTaskType::RegisterPushToken,
        QueueTaskType::DeletePushToken,
        QueueTaskType::TrackPushMetric,
        QueueTaskType::TrackDeliveryEvent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QueueTaskType::IdentifyProfile => "identifyProfile",
            QueueTaskType::TrackEvent => "trackEvent",
            QueueTaskType::RegisterPushToken => "registerPushToken",
            QueueTaskType::DeletePushToken => "deletePushToken",
            QueueTaskType::TrackPushMetric => "trackPushMetric",
            QueueTaskType::TrackDeliveryEvent => "trackDeliveryEvent",
        }
    }

    pub fn parse(task_type: &TaskType) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|known| known.as_str() == task_type.as_str())
    }
}

impl From<QueueTaskType> for TaskType {
    fn from(t: QueueTaskType) -> Self {
        TaskType::new(t.as_str())
    }
}

impl fmt::Display for QueueTaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
