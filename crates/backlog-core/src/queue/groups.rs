//! GroupIndex - inventory スナップショット上のグループ待ち判定
//!
//! # 設計
//! - anchor: group key -> その group を `group_start` に宣言した task
//! - blocking group のどれかに自分以外の anchor が残っている間は blocked

use std::collections::{HashMap, HashSet};

use crate::domain::{QueueTaskMetadata, StorageId};

pub struct GroupIndex<'a> {
    anchors: HashMap<&'a str, HashSet<StorageId>>,
}

impl<'a> GroupIndex<'a> {
    pub fn from_inventory(inventory: &'a [QueueTaskMetadata]) -> Self {
        let mut anchors: HashMap<&'a str, HashSet<StorageId>> = HashMap::new();
        for meta in inventory {
            for group in &meta.groups_parent {
                anchors
                    .entry(group.as_str())
                    .or_default()
                    .insert(meta.task_persisted_id);
            }
        }
        Self { anchors }
    }

    /// Anchors `meta` is waiting on.
    pub fn blocking_anchors(&self, meta: &QueueTaskMetadata) -> Vec<StorageId> {
        let mut blockers: Vec<StorageId> = meta
            .groups_child
            .iter()
            .filter_map(|group| self.anchors.get(group.as_str()))
            .flatten()
            .copied()
            .filter(|anchor| *anchor != meta.task_persisted_id)
            .collect();
        blockers.sort();
        blockers.dedup();
        blockers
    }

    pub fn is_blocked(&self, meta: &QueueTaskMetadata) -> bool {
        !self.blocking_anchors(meta).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{QueueTaskGroup, TaskType};
    use chrono::Utc;
    use ulid::Ulid;

    fn meta(group_start: Option<QueueTaskGroup>, blocking: &[QueueTaskGroup]) -> QueueTaskMetadata {
        QueueTaskMetadata::new(
            StorageId::from_ulid(Ulid::new()),
            TaskType::new("t"),
            group_start.as_ref(),
            blocking,
            Utc::now(),
        )
    }

    fn profile(id: &str) -> QueueTaskGroup {
        QueueTaskGroup::IdentifiedProfile(id.to_string())
    }

    #[test]
    fn ungrouped_tasks_are_never_blocked() {
        let inventory = vec![meta(None, &[]), meta(None, &[])];
        let index = GroupIndex::from_inventory(&inventory);
        assert!(inventory.iter().all(|m| !index.is_blocked(m)));
    }

    #[test]
    fn child_waits_for_anchor() {
        let anchor = meta(Some(profile("1")), &[]);
        let child = meta(None, &[profile("1")]);
        let inventory = vec![anchor.clone(), child.clone()];
        let index = GroupIndex::from_inventory(&inventory);

        assert!(!index.is_blocked(&anchor));
        assert_eq!(index.blocking_anchors(&child), vec![anchor.task_persisted_id]);
    }

    #[test]
    fn child_blocked_even_when_created_before_anchor() {
        let child = meta(None, &[profile("1")]);
        let anchor = meta(Some(profile("1")), &[]);
        let inventory = vec![child.clone(), anchor];
        let index = GroupIndex::from_inventory(&inventory);
        assert!(index.is_blocked(&child));
    }

    #[test]
    fn child_runs_once_anchor_is_gone() {
        let child = meta(None, &[profile("1")]);
        let inventory = vec![child.clone()];
        let index = GroupIndex::from_inventory(&inventory);
        assert!(!index.is_blocked(&child));
    }

    #[test]
    fn other_groups_do_not_block() {
        let anchor = meta(Some(profile("1")), &[]);
        let child = meta(None, &[profile("2")]);
        let inventory = vec![anchor, child.clone()];
        let index = GroupIndex::from_inventory(&inventory);
        assert!(!index.is_blocked(&child));
    }

    #[test]
    fn task_does_not_block_itself() {
        let both = meta(Some(profile("1")), &[profile("1")]);
        let inventory = vec![both.clone()];
        let index = GroupIndex::from_inventory(&inventory);
        assert!(!index.is_blocked(&both));
    }

    #[test]
    fn multiple_anchors_are_all_reported() {
        let a = meta(Some(profile("1")), &[]);
        let b = meta(Some(QueueTaskGroup::RegisteredPushToken("tok".into())), &[]);
        let child = meta(
            None,
            &[profile("1"), QueueTaskGroup::RegisteredPushToken("tok".into())],
        );
        let inventory = vec![a.clone(), b.clone(), child.clone()];
        let index = GroupIndex::from_inventory(&inventory);

        let mut expected = vec![a.task_persisted_id, b.task_persisted_id];
        expected.sort();
        assert_eq!(index.blocking_anchors(&child), expected);
    }
}
