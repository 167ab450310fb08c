//! Payloads - 組み込み task_type の task data

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::typed::TaskPayload;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyProfileQueueTaskData {
    pub identifier: String,
    /// Profile attributes, already encoded as a JSON object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes_json_string: Option<String>,
}

impl TaskPayload for IdentifyProfileQueueTaskData {
    const TYPE: &'static str = "identifyProfile";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackEventQueueTaskData {
    pub identifier: String,
    /// The event request body, already encoded as JSON.
    pub attributes_json_string: String,
}

impl TaskPayload for TrackEventQueueTaskData {
    const TYPE: &'static str = "trackEvent";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPushNotificationQueueTaskData {
    pub profile_identifier: String,
    /// The device request body, already encoded as JSON.
    pub attributes_json_string: String,
}

impl TaskPayload for RegisterPushNotificationQueueTaskData {
    const TYPE: &'static str = "registerPushToken";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePushNotificationQueueTaskData {
    pub profile_identifier: String,
    pub device_token: String,
}

impl TaskPayload for DeletePushNotificationQueueTaskData {
    const TYPE: &'static str = "deletePushToken";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Delivered,
    Opened,
    Converted,
    Clicked,
}

/// Push metric; serialized as-is into the request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricRequest {
    pub delivery_id: String,
    pub event: Metric,
    pub device_id: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
}

impl TaskPayload for MetricRequest {
    const TYPE: &'static str = "trackPushMetric";
}

/// In-app delivery metric; serialized as-is into the request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryEventRequest {
    #[serde(rename = "type")]
    pub delivery_type: String,
    pub payload: DeliveryPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryPayload {
    pub delivery_id: String,
    pub event: Metric,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl TaskPayload for DeliveryEventRequest {
    const TYPE: &'static str = "trackDeliveryEvent";
}
