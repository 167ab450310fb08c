//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」を定義します。
//! queue が消費する外部コラボレータ（時刻、ID、blob ストレージ、HTTP）と、
//! queue 自身の永続化境界（TaskStore）をここに置きます。

pub mod clock;
pub mod http;
pub mod id_generator;
pub mod key_value;
pub mod task_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::http::{HttpClient, HttpMethod, HttpRequestParams};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::key_value::{KeyValueStore, StorageError};
pub use self::task_store::TaskStore;
