use crate::ports::HttpMethod;

/// Backend endpoints the built-in runner calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    IdentifyCustomer { identifier: String },
    TrackCustomerEvent { identifier: String },
    RegisterDevice { identifier: String },
    DeleteDevice { identifier: String, device_token: String },
    PushMetrics,
    TrackDeliveryMetrics,
}

impl Endpoint {
    pub fn method(&self) -> HttpMethod {
        match self {
            Endpoint::IdentifyCustomer { .. } | Endpoint::RegisterDevice { .. } => HttpMethod::Put,
            Endpoint::TrackCustomerEvent { .. }
            | Endpoint::PushMetrics
            | Endpoint::TrackDeliveryMetrics => HttpMethod::Post,
            Endpoint::DeleteDevice { .. } => HttpMethod::Delete,
        }
    }

    /// Path with every dynamic segment percent-encoded.
    pub fn path(&self) -> String {
        let enc = |s: &str| urlencoding::encode(s).into_owned();
        match self {
            Endpoint::IdentifyCustomer { identifier } => {
                format!("/api/v1/customers/{}", enc(identifier))
            }
            Endpoint::TrackCustomerEvent { identifier } => {
                format!("/api/v1/customers/{}/events", enc(identifier))
            }
            Endpoint::RegisterDevice { identifier } => {
                format!("/api/v1/customers/{}/devices", enc(identifier))
            }
            Endpoint::DeleteDevice {
                identifier,
                device_token,
            } => format!(
                "/api/v1/customers/{}/devices/{}",
                enc(identifier),
                enc(device_token)
            ),
            Endpoint::PushMetrics => "/push/events".to_string(),
            Endpoint::TrackDeliveryMetrics => "/api/v1/cio_deliveries/events".to_string(),
        }
    }
}
