//! ApiQueueRunner - SDK 組み込み task_type を HTTP 呼び出しで実行する

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::QueueRunner;
use super::endpoint::Endpoint;
use super::payloads::{
    DeletePushNotificationQueueTaskData, DeliveryEventRequest, IdentifyProfileQueueTaskData,
    MetricRequest, RegisterPushNotificationQueueTaskData, TrackEventQueueTaskData,
};
use crate::domain::{QueueTask, QueueTaskType, RunError, TaskType};
use crate::ports::{HttpClient, HttpRequestParams};
use crate::queue::{FailureDisposition, FailurePolicy};
use crate::typed::JsonCodec;

/// Maps every `QueueTaskType` onto one backend request.
pub struct ApiQueueRunner {
    http: Arc<dyn HttpClient>,
    codec: JsonCodec,
    policy: FailurePolicy,
}

impl ApiQueueRunner {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            codec: JsonCodec,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Task types to register this runner under.
    pub fn task_types() -> Vec<TaskType> {
        QueueTaskType::ALL.into_iter().map(TaskType::from).collect()
    }

    fn decode<T: DeserializeOwned>(&self, task: &QueueTask) -> Result<T, RunError> {
        self.codec
            .decode(&task.data)
            .map_err(|e| RunError::InvalidTaskData(e.to_string()))
    }

    fn encode<T: serde::Serialize>(&self, value: &T) -> Result<Vec<u8>, RunError> {
        self.codec
            .encode(value)
            .map_err(|e| RunError::InvalidTaskData(e.to_string()))
    }

    fn build_request(
        &self,
        task_type: QueueTaskType,
        task: &QueueTask,
    ) -> Result<HttpRequestParams, RunError> {
        let (endpoint, body) = match task_type {
            QueueTaskType::IdentifyProfile => {
                let data: IdentifyProfileQueueTaskData = self.decode(task)?;
                let body = data.attributes_json_string.map(String::into_bytes);
                (
                    Endpoint::IdentifyCustomer {
                        identifier: data.identifier,
                    },
                    body,
                )
            }
            QueueTaskType::TrackEvent => {
                let data: TrackEventQueueTaskData = self.decode(task)?;
                (
                    Endpoint::TrackCustomerEvent {
                        identifier: data.identifier,
                    },
                    Some(data.attributes_json_string.into_bytes()),
                )
            }
            QueueTaskType::RegisterPushToken => {
                let data: RegisterPushNotificationQueueTaskData = self.decode(task)?;
                (
                    Endpoint::RegisterDevice {
                        identifier: data.profile_identifier,
                    },
                    Some(data.attributes_json_string.into_bytes()),
                )
            }
            QueueTaskType::DeletePushToken => {
                let data: DeletePushNotificationQueueTaskData = self.decode(task)?;
                (
                    Endpoint::DeleteDevice {
                        identifier: data.profile_identifier,
                        device_token: data.device_token,
                    },
                    None,
                )
            }
            QueueTaskType::TrackPushMetric => {
                let data: MetricRequest = self.decode(task)?;
                (Endpoint::PushMetrics, Some(self.encode(&data)?))
            }
            QueueTaskType::TrackDeliveryEvent => {
                let data: DeliveryEventRequest = self.decode(task)?;
                (Endpoint::TrackDeliveryMetrics, Some(self.encode(&data)?))
            }
        };

        let params = HttpRequestParams::new(endpoint.method(), endpoint.path());
        Ok(match body {
            Some(body) => params.with_json_body(body),
            None => params,
        })
    }
}

#[async_trait]
impl QueueRunner for ApiQueueRunner {
    async fn run_task(&self, task: &QueueTask) -> Option<Result<(), RunError>> {
        let task_type = QueueTaskType::parse(&task.task_type)?;

        let params = match self.build_request(task_type, task) {
            Ok(params) => params,
            Err(e) => return Some(Err(e)),
        };
        debug!(
            storage_id = %task.storage_id,
            %task_type,
            method = %params.method,
            path = %params.path,
            "sending queued request"
        );

        Some(
            self.http
                .request(params)
                .await
                .map(|_body| ())
                .map_err(RunError::from),
        )
    }

    fn classify(&self, error: &RunError) -> FailureDisposition {
        self.policy.classify(error)
    }
}
