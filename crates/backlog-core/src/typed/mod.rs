//! Typed - 型付き task API
//!
//! task_type の typo を型で排除し、runner との対応付けを静的に保証します。
//!
//! # 二層構造
//! - **表層（Typed）**: `TaskPayload` trait, `Handler<T>` trait - 型安全
//! - **内部（Dyn）**: `QueueRunner` trait object - object-safe, type erasure

pub mod codec;
pub mod handler;
pub mod registry;
pub mod task;

pub use self::codec::{CodecError, JsonCodec};
pub use self::handler::{Handler, TypedRunner};
pub use self::registry::{Dispatch, RegistryError, RunnerRegistry};
pub use self::task::TaskPayload;
