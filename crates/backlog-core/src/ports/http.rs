//! HttpClient port - backend への HTTP 呼び出し
//!
//! transport の詳細は扱わない。request → body bytes / HttpError の契約のみ。

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;

use crate::domain::HttpError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Post,
    Put,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequestParams {
    pub method: HttpMethod,
    /// Path relative to the API base URL, already percent-encoded.
    pub path: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequestParams {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn with_json_body(mut self, body: Vec<u8>) -> Self {
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        self.body = Some(body);
        self
    }
}

#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform one request; `Ok` carries the response body of a 2xx answer.
    async fn request(&self, params: HttpRequestParams) -> Result<Vec<u8>, HttpError>;
}
