//! QueueTaskGroup - 実行順序を制約するグループ

use std::fmt;

/// A named ordering constraint between tasks.
///
/// The task created with `group_start = G` anchors the group; every task
/// created with `G` in its blocking groups waits until the anchor is gone
/// from the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueueTaskGroup {
    IdentifiedProfile(String),
    RegisteredPushToken(String),
}

impl QueueTaskGroup {
    /// Key stored in task metadata.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for QueueTaskGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueTaskGroup::IdentifiedProfile(id) => write!(f, "identified_profile_{id}"),
            QueueTaskGroup::RegisteredPushToken(token) => write!(f, "registered_push_token_{token}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(QueueTaskGroup::IdentifiedProfile("123".into()), "identified_profile_123")]
    #[case(QueueTaskGroup::RegisteredPushToken("abc".into()), "registered_push_token_abc")]
    fn renders_group_key(#[case] group: QueueTaskGroup, #[case] expected: &str) {
        assert_eq!(group.key(), expected);
    }
}
