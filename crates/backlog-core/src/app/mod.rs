//! App - アプリケーション層
//!
//! ports と queue を組み合わせて、起動時検証済みの Queue を組み立てます。
//!
//! # 主要コンポーネント
//! - **QueueBuilder**: runner 登録、fail-fast 検証、storage のオープン

pub mod builder;

pub use self::builder::{BuildError, QueueBuilder};
