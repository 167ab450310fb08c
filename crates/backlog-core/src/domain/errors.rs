//! Errors - 実行エラーの分類
//!
//! - HttpError: HTTP 呼び出しの失敗
//! - RunError: runner が coordinator に返す失敗

use thiserror::Error;

/// Failure of one HTTP request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    /// The request never got a response (offline, DNS, timeout).
    #[error("no response from server: {0}")]
    NoResponse(String),

    #[error("request unauthorized (401)")]
    Unauthorized,

    #[error("unsuccessful status code {0}")]
    UnsuccessfulStatus(u16),

    #[error("request cancelled")]
    Cancelled,

    /// A response arrived but its body could not be decoded.
    #[error("response decode failed: {0}")]
    ResponseDecode(String),
}

/// What a runner reports back for a task it accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The stored payload does not decode into the runner's type.
    #[error("invalid task data: {0}")]
    InvalidTaskData(String),
}
