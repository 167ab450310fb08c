//! Handler trait - 型付き task data を実行する Handler
//!
//! # 学習ポイント
//! - ジェネリック trait (Handler<T>)
//! - Type erasure パターン (TypedRunner<T, H> → dyn QueueRunner)

use std::marker::PhantomData;

use async_trait::async_trait;

use super::codec::JsonCodec;
use super::task::TaskPayload;
use crate::domain::{QueueTask, RunError};
use crate::queue::{FailureDisposition, FailurePolicy};
use crate::runner::QueueRunner;

/// Handler は decode 済みの task data を実行する
///
/// # 使用例
/// ```ignore
/// struct InAppDismissHandler { http: Arc<dyn HttpClient> }
///
/// #[async_trait]
/// impl Handler<InAppDismissData> for InAppDismissHandler {
///     async fn handle(&self, data: InAppDismissData) -> Result<(), RunError> {
///         self.http.request(...).await?;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Handler<T: TaskPayload>: Send + Sync {
    async fn handle(&self, data: T) -> Result<(), RunError>;
}

/// Adapts a `Handler<T>` to the object-safe `QueueRunner` contract.
///
/// Data that does not decode into `T` is reported as
/// `RunError::InvalidTaskData`, which the default policy drops.
pub struct TypedRunner<T: TaskPayload, H: Handler<T>> {
    handler: H,
    codec: JsonCodec,
    policy: FailurePolicy,
    _marker: PhantomData<fn() -> T>,
}

impl<T: TaskPayload, H: Handler<T>> TypedRunner<T, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            codec: JsonCodec,
            policy: FailurePolicy::default(),
            _marker: PhantomData,
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[async_trait]
impl<T: TaskPayload, H: Handler<T>> QueueRunner for TypedRunner<T, H> {
    async fn run_task(&self, task: &QueueTask) -> Option<Result<(), RunError>> {
        if task.task_type.as_str() != T::TYPE {
            return None;
        }
        let data: T = match self.codec.decode(&task.data) {
            Ok(data) => data,
            Err(e) => return Some(Err(RunError::InvalidTaskData(e.to_string()))),
        };
        Some(self.handler.handle(data).await)
    }

    fn classify(&self, error: &RunError) -> FailureDisposition {
        self.policy.classify(error)
    }
}
