//! backlog-core
//!
//! analytics SDK 向けの永続 background task queue
//!
//! producer は任意の task から処理（profile の identify、event の track、
//! push token の登録）を積む。queue はローカルに永続化し、作成順に backend
//! へ再送する。失敗した task は次のパスまで残る。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, task_type, group, task, status, errors）
//! - **ports**: 抽象化レイヤー（Clock, IdGenerator, KeyValueStore, HttpClient, TaskStore）
//! - **impls**: ports の実装（FileKeyValueStore, InMemoryKeyValueStore）
//! - **queue**: Queue 本体、永続化、dispatch pass、retry 分類
//! - **runner**: QueueRunner trait と SDK 組み込みの ApiQueueRunner
//! - **typed**: 型付き Task API（TaskPayload, Handler, RunnerRegistry, JsonCodec）
//! - **app**: QueueBuilder（起動時検証とワイヤリング）
//! - **config**: QueueConfig（TOML）

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod queue;
pub mod runner;
pub mod typed;

pub use app::{BuildError, QueueBuilder};
pub use config::{ConfigError, QueueConfig};
pub use domain::{
    HttpError, QueueStatus, QueueTask, QueueTaskGroup, QueueTaskMetadata, QueueTaskType,
    RunError, StorageId, TaskType,
};
pub use queue::{AddTaskResult, FailureDisposition, FailurePolicy, Queue, RunSummary};
pub use runner::{ApiQueueRunner, QueueRunner};
pub use typed::{Handler, RunnerRegistry, TaskPayload};
