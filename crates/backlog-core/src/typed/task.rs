//! TaskPayload trait - 型付き task data の定義
//!
//! - Associated Constants (`const TYPE`) で task_type と型を対応付ける

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::TaskType;

/// Typed task data with a fixed task type.
///
/// # 使用例
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct InAppDismissData {
///     message_id: String,
/// }
///
/// impl TaskPayload for InAppDismissData {
///     const TYPE: &'static str = "inAppDismiss";
/// }
/// ```
///
/// # Trait Bounds
/// - `Serialize`: enqueue 時に bytes へ
/// - `DeserializeOwned`: runner が bytes から復元
/// - `Send + Sync + 'static`: runner を Arc に格納するため
pub trait TaskPayload: Serialize + DeserializeOwned + Send + Sync + 'static {
    const TYPE: &'static str;

    fn task_type() -> TaskType {
        TaskType::new(Self::TYPE)
    }
}
