//! QueueBuilder - queue の構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 開いた直後に期限切れ task を掃除する

use std::sync::Arc;

use tracing::info;

use crate::config::{ConfigError, QueueConfig};
use crate::domain::TaskType;
use crate::impls::{FileKeyValueStore, InMemoryKeyValueStore};
use crate::ports::{Clock, HttpClient, KeyValueStore, StorageError, SystemClock, UlidGenerator};
use crate::queue::{Queue, QueueStorage};
use crate::runner::{ApiQueueRunner, QueueRunner};
use crate::typed::{Handler, RegistryError, RunnerRegistry, TaskPayload};

/// QueueBuilder は Queue を構築
///
/// # 使用例
/// ```ignore
/// let queue = QueueBuilder::new(config)
///     .with_api_runner(http)?
///     .register::<InAppDismissData, _>(InAppDismissHandler)?
///     .expect_task_types(&["identifyProfile", "inAppDismiss"])
///     .open_configured()
///     .await?;
/// ```
///
/// # Fail-fast 設計
/// - expect_task_types() で期待される task_type を登録
/// - open 時に「期待集合 ⊆ 登録済み集合」をチェック
/// - 不足があれば BuildError を返す
pub struct QueueBuilder {
    config: QueueConfig,
    runners: RunnerRegistry,
    expected_types: Option<Vec<TaskType>>,
    clock: Arc<dyn Clock>,
}

/// BuildError は queue 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing task types: {0:?}. These tasks were expected but no runner is registered.")]
    MissingTaskTypes(Vec<String>),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("could not open queue storage: {0}")]
    Storage(#[from] StorageError),
}

impl QueueBuilder {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            runners: RunnerRegistry::new(),
            expected_types: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Runner を task_type 群に登録
    pub fn register_runner(
        mut self,
        task_types: impl IntoIterator<Item = TaskType>,
        runner: Arc<dyn QueueRunner>,
    ) -> Result<Self, RegistryError> {
        self.runners.register(task_types, runner)?;
        Ok(self)
    }

    /// Handler を登録
    ///
    /// # Example
    /// ```ignore
    /// builder.register::<InAppDismissData, _>(InAppDismissHandler)?;
    /// ```
    pub fn register<T: TaskPayload, H: Handler<T> + 'static>(
        mut self,
        handler: H,
    ) -> Result<Self, RegistryError> {
        self.runners.register_handler::<T, H>(handler)?;
        Ok(self)
    }

    /// SDK 組み込みの task_type を `ApiQueueRunner` で処理する
    pub fn with_api_runner(self, http: Arc<dyn HttpClient>) -> Result<Self, RegistryError> {
        self.register_runner(
            ApiQueueRunner::task_types(),
            Arc::new(ApiQueueRunner::new(http)),
        )
    }

    /// 期待される task_type のリストを設定
    pub fn expect_task_types(mut self, task_types: &[&str]) -> Self {
        self.expected_types = Some(task_types.iter().map(|&t| TaskType::new(t)).collect());
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Open the queue on `kv`, then discard expired tasks.
    pub async fn open(self, kv: Arc<dyn KeyValueStore>) -> Result<Queue, BuildError> {
        self.config.validate()?;

        if let Some(expected_types) = &self.expected_types {
            let registered_types = self.runners.registered_types();
            let missing: Vec<String> = expected_types
                .iter()
                .filter(|t| !registered_types.contains(t))
                .map(|t| t.to_string())
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingTaskTypes(missing));
            }
        }

        let ids = Arc::new(UlidGenerator::new(Arc::clone(&self.clock)));
        let storage = QueueStorage::open(kv, Arc::clone(&self.clock), ids).await?;
        let queue = Queue::new(self.config, Arc::new(storage), self.runners, self.clock);

        queue.delete_expired_tasks().await;
        let status = queue.status().await;
        info!(
            queue_id = %status.queue_id,
            pending = status.num_tasks_in_queue,
            "queue opened"
        );
        Ok(queue)
    }

    /// Open on the directory from `QueueConfig::queue_dir`, or in memory when
    /// no `storage_dir` is configured.
    pub async fn open_configured(self) -> Result<Queue, BuildError> {
        let kv: Arc<dyn KeyValueStore> = match self.config.queue_dir() {
            Some(dir) => Arc::new(FileKeyValueStore::new(dir)),
            None => Arc::new(InMemoryKeyValueStore::new()),
        };
        self.open(kv).await
    }
}
