//! FailurePolicy - 失敗した task の扱い（retry / halt / drop）を決める

use crate::domain::{HttpError, RunError};

/// What the coordinator does with a task whose run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDisposition {
    /// Keep the task and count the attempt; a later pass retries it.
    Retry,

    /// Like `Retry`, and end the current pass: the remaining requests would
    /// fail the same way (offline, bad credentials).
    RetryAndHalt,

    /// Delete the task; retrying cannot change the outcome.
    Drop,
}

/// Status-code based classification of run failures.
///
/// Defaults:
/// - no response, cancelled, 5xx, 408, 429 → `Retry`
/// - 401 → `RetryAndHalt`, and no response also halts the pass
/// - other 4xx, invalid task data, undecodable response → `Drop`
#[derive(Debug, Clone)]
pub struct FailurePolicy {
    /// 4xx codes that still deserve a retry.
    pub retryable_client_statuses: Vec<u16>,

    /// Halt the pass when the request got no response at all.
    pub halt_on_no_response: bool,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self {
            retryable_client_statuses: vec![408, 429],
            halt_on_no_response: true,
        }
    }
}

impl FailurePolicy {
    pub fn classify(&self, error: &RunError) -> FailureDisposition {
        match error {
            RunError::InvalidTaskData(_) => FailureDisposition::Drop,
            RunError::Http(http) => self.classify_http(http),
        }
    }

    pub fn classify_http(&self, error: &HttpError) -> FailureDisposition {
        match error {
            HttpError::NoResponse(_) if self.halt_on_no_response => FailureDisposition::RetryAndHalt,
            HttpError::NoResponse(_) | HttpError::Cancelled => FailureDisposition::Retry,
            HttpError::Unauthorized => FailureDisposition::RetryAndHalt,
            HttpError::UnsuccessfulStatus(401) => FailureDisposition::RetryAndHalt,
            HttpError::UnsuccessfulStatus(code) if *code >= 500 => FailureDisposition::Retry,
            HttpError::UnsuccessfulStatus(code)
                if self.retryable_client_statuses.contains(code) =>
            {
                FailureDisposition::Retry
            }
            HttpError::UnsuccessfulStatus(code) if (400..500).contains(code) => {
                FailureDisposition::Drop
            }
            // 1xx/3xx surfacing as failures: the transport misbehaved, try again later
            HttpError::UnsuccessfulStatus(_) => FailureDisposition::Retry,
            HttpError::ResponseDecode(_) => FailureDisposition::Drop,
        }
    }
}
