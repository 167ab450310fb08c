//! Impls - ports の実装
//!
//! - FileKeyValueStore: ファイルベース（本番用）
//! - InMemoryKeyValueStore: テスト・一時キュー用

pub mod file_kv;
pub mod inmem_kv;

pub use self::file_kv::FileKeyValueStore;
pub use self::inmem_kv::InMemoryKeyValueStore;
