//! KeyValueStore port - blob の永続化
//!
//! - FileKeyValueStore: ディレクトリ配下にファイルとして保存（本番用）
//! - InMemoryKeyValueStore: テスト用

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::StorageId;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not serialize '{key}': {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("task {0} not found")]
    TaskNotFound(StorageId),
}

/// Blob storage addressed by relative, `/`-separated keys.
///
/// `write` replaces the whole blob atomically: readers see the old bytes or
/// the new bytes, never a mix. `remove` of a missing key succeeds.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    async fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}
