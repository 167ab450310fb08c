//! Queue - 永続化された task queue 本体
//!
//! - **Queue**: add_task / run / status の公開 API
//! - **QueueStorage**: 永続化（inventory + task body）
//! - **RunRequest / RunManager**: 実行パスとその合流
//! - **FailurePolicy**: 失敗時の retry 分類

mod groups;
mod retry;
mod run_manager;
mod run_request;
mod storage;

pub use groups::GroupIndex;
pub use retry::{FailureDisposition, FailurePolicy};
pub use run_request::RunSummary;
pub use storage::QueueStorage;

use std::sync::{Arc, Mutex, Weak};

use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::QueueConfig;
use crate::domain::{QueueStatus, QueueTaskGroup, StorageId, TaskType};
use crate::ports::{Clock, TaskStore};
use crate::typed::{JsonCodec, RunnerRegistry, TaskPayload};
use run_manager::RunManager;
use run_request::RunRequest;

/// Result of `Queue::add_task`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddTaskResult {
    /// `false` means the task was not persisted at all.
    pub success: bool,
    pub status: QueueStatus,
    /// Id of the created task.
    pub storage_id: Option<StorageId>,
}

struct QueueInner {
    config: QueueConfig,
    storage: Arc<dyn TaskStore>,
    runners: RunnerRegistry,
    clock: Arc<dyn Clock>,
    codec: JsonCodec,
    run_manager: RunManager,
    delayed_run: Mutex<Option<JoinHandle<()>>>,
}

/// Durable background task queue.
///
/// Producers call `add_task` from any task; the call persists the task and
/// returns without waiting for the network. Passes run on spawned tokio tasks
/// and are coalesced so that only one drains the backlog at a time.
///
/// Cloning is cheap; clones share the same queue.
#[derive(Clone)]
pub struct Queue {
    inner: Arc<QueueInner>,
}

impl Queue {
    pub fn new(
        config: QueueConfig,
        storage: Arc<dyn TaskStore>,
        runners: RunnerRegistry,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                config,
                storage,
                runners,
                clock,
                codec: JsonCodec,
                run_manager: RunManager::new(),
                delayed_run: Mutex::new(None),
            }),
        }
    }

    pub fn queue_id(&self) -> &str {
        &self.inner.config.site_id
    }

    pub fn config(&self) -> &QueueConfig {
        &self.inner.config
    }

    /// Encode `data` and persist it as a new task of `task_type`.
    ///
    /// An encoding or storage failure returns `success == false` and leaves
    /// nothing behind. On success a pass is started in the background, or a
    /// delayed one is scheduled while the backlog is below
    /// `min_tasks_to_run`.
    pub async fn add_task<T: Serialize + ?Sized>(
        &self,
        task_type: impl Into<TaskType>,
        data: &T,
        group_start: Option<QueueTaskGroup>,
        blocking_groups: &[QueueTaskGroup],
    ) -> AddTaskResult {
        let task_type = task_type.into();

        let bytes = match self.inner.codec.encode(data) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(%task_type, error = %e, "task data could not be encoded, task not added");
                return self.failed_add().await;
            }
        };

        let created = match self
            .inner
            .storage
            .create(task_type.clone(), bytes, group_start, blocking_groups)
            .await
        {
            Ok(created) => created,
            Err(e) => {
                error!(%task_type, error = %e, "task could not be persisted");
                return self.failed_add().await;
            }
        };

        let status = self.status().await;
        debug!(
            storage_id = %created.task_persisted_id,
            %task_type,
            pending = status.num_tasks_in_queue,
            "task added"
        );
        self.trigger_after_add(status.num_tasks_in_queue);

        AddTaskResult {
            success: true,
            status,
            storage_id: Some(created.task_persisted_id),
        }
    }

    /// Typed variant of `add_task`; the task type comes from `T::TYPE`.
    pub async fn add<T: TaskPayload>(
        &self,
        data: &T,
        group_start: Option<QueueTaskGroup>,
        blocking_groups: &[QueueTaskGroup],
    ) -> AddTaskResult {
        self.add_task(T::task_type(), data, group_start, blocking_groups)
            .await
    }

    async fn failed_add(&self) -> AddTaskResult {
        AddTaskResult {
            success: false,
            status: self.status().await,
            storage_id: None,
        }
    }

    pub async fn status(&self) -> QueueStatus {
        let pending = self.inner.storage.inventory().await.len();
        QueueStatus::new(self.queue_id(), pending)
    }

    /// Process the backlog now and wait for the pass to finish.
    ///
    /// A call made while a pass is active does not start another one; it
    /// waits for the active pass and gets that pass's summary.
    pub async fn run(&self) -> RunSummary {
        QueueInner::run(&self.inner).await
    }

    /// Callback form of `run`; `on_complete` fires once the pass is done.
    pub fn run_with<F>(&self, on_complete: F)
    where
        F: FnOnce(RunSummary) + Send + 'static,
    {
        let queue = self.clone();
        tokio::spawn(async move {
            let summary = queue.run().await;
            on_complete(summary);
        });
    }

    pub fn is_running(&self) -> bool {
        self.inner.run_manager.is_running()
    }

    /// Delete one task; unknown ids succeed.
    pub async fn delete_task(&self, storage_id: StorageId) -> bool {
        match self.inner.storage.delete(storage_id).await {
            Ok(()) => true,
            Err(e) => {
                warn!(%storage_id, error = %e, "could not delete task");
                false
            }
        }
    }

    /// Delete tasks older than `expired_task_max_age_secs`.
    ///
    /// Tasks anchoring a group are kept: deleting one would release its
    /// dependants before it ran.
    pub async fn delete_expired_tasks(&self) -> Vec<StorageId> {
        let Some(cutoff) = chrono::Duration::from_std(self.inner.config.expired_task_max_age())
            .ok()
            .and_then(|max_age| self.inner.clock.now().checked_sub_signed(max_age))
        else {
            return Vec::new();
        };

        let expired: Vec<StorageId> = self
            .inner
            .storage
            .inventory()
            .await
            .into_iter()
            .filter(|meta| meta.created_at < cutoff && !meta.is_group_anchor())
            .map(|meta| meta.task_persisted_id)
            .collect();

        let mut deleted = Vec::with_capacity(expired.len());
        for storage_id in expired {
            if self.delete_task(storage_id).await {
                deleted.push(storage_id);
            }
        }
        if !deleted.is_empty() {
            info!(count = deleted.len(), "deleted expired tasks");
        }
        deleted
    }

    fn trigger_after_add(&self, pending: usize) {
        if pending >= self.inner.config.min_tasks_to_run {
            self.cancel_delayed_run();
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move {
                QueueInner::run_followup(&inner).await;
            });
        } else {
            self.schedule_delayed_run();
        }
    }

    /// Schedule a single delayed pass; no-op while one is already pending.
    fn schedule_delayed_run(&self) {
        let mut slot = self
            .inner
            .delayed_run
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let delay = self.inner.config.run_delay();
        let weak: Weak<QueueInner> = Arc::downgrade(&self.inner);
        debug!(delay_secs = delay.as_secs(), "scheduling delayed queue run");
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                QueueInner::run_followup(&inner).await;
            }
        }));
    }

    fn cancel_delayed_run(&self) {
        let handle = self
            .inner
            .delayed_run
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

/// Releases the run manager if the driver is dropped mid-pass.
struct AbandonOnDrop {
    inner: Arc<QueueInner>,
    armed: bool,
}

impl Drop for AbandonOnDrop {
    fn drop(&mut self) {
        if self.armed {
            self.inner.run_manager.abandon();
        }
    }
}

impl QueueInner {
    async fn run(this: &Arc<QueueInner>) -> RunSummary {
        let (start, done) = this.run_manager.register();
        Self::await_pass(this, start, done).await
    }

    /// Used after adds: a pass already in progress never sees tasks created
    /// after its snapshot, so another pass is queued behind it.
    async fn run_followup(this: &Arc<QueueInner>) -> RunSummary {
        let (start, done) = this.run_manager.register_followup();
        Self::await_pass(this, start, done).await
    }

    async fn await_pass(
        this: &Arc<QueueInner>,
        start: bool,
        done: oneshot::Receiver<RunSummary>,
    ) -> RunSummary {
        if start {
            tokio::spawn(Self::drive(Arc::clone(this)));
        }
        done.await.unwrap_or_default()
    }

    /// Runs passes until no follow-up is pending.
    async fn drive(inner: Arc<QueueInner>) {
        let mut guard = AbandonOnDrop {
            inner: Arc::clone(&inner),
            armed: true,
        };
        loop {
            let summary = RunRequest {
                queue_id: &inner.config.site_id,
                storage: inner.storage.as_ref(),
                runners: &inner.runners,
            }
            .start()
            .await;
            if !inner.run_manager.finish(summary) {
                break;
            }
            debug!(queue_id = %inner.config.site_id, "tasks added during the pass, running again");
        }
        guard.armed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use tokio::sync::Notify;

    use crate::domain::{HttpError, QueueTask, RunError};
    use crate::impls::InMemoryKeyValueStore;
    use crate::ports::{FixedClock, KeyValueStore, UlidGenerator};
    use crate::runner::QueueRunner;

    /// Answers from a per-type script (default: success) and records payloads.
    #[derive(Default)]
    struct ScriptedRunner {
        script: Mutex<HashMap<String, VecDeque<Result<(), RunError>>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        fn fail(&self, task_type: &str, errors: impl IntoIterator<Item = RunError>) {
            self.script
                .lock()
                .unwrap()
                .entry(task_type.to_string())
                .or_default()
                .extend(errors.into_iter().map(Err));
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl QueueRunner for ScriptedRunner {
        async fn run_task(&self, task: &QueueTask) -> Option<Result<(), RunError>> {
            let payload: String = serde_json::from_slice(&task.data).unwrap();
            self.calls.lock().unwrap().push(payload);
            let next = self
                .script
                .lock()
                .unwrap()
                .get_mut(task.task_type.as_str())
                .and_then(VecDeque::pop_front);
            Some(next.unwrap_or(Ok(())))
        }
    }

    struct Harness {
        queue: Queue,
        storage: Arc<QueueStorage>,
        kv: Arc<InMemoryKeyValueStore>,
        clock: Arc<FixedClock>,
        runner: Arc<ScriptedRunner>,
    }

    /// Passes only start when a test asks for them.
    fn manual_config() -> QueueConfig {
        QueueConfig {
            site_id: "test-site".into(),
            min_tasks_to_run: 100,
            run_delay_secs: 3600,
            ..QueueConfig::default()
        }
    }

    async fn harness(config: QueueConfig) -> Harness {
        let kv = Arc::new(InMemoryKeyValueStore::new());
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        ));
        let storage = Arc::new(
            QueueStorage::open(
                kv.clone() as Arc<dyn KeyValueStore>,
                clock.clone(),
                Arc::new(UlidGenerator::new(clock.clone())),
            )
            .await
            .unwrap(),
        );

        let runner = Arc::new(ScriptedRunner::default());
        let mut runners = RunnerRegistry::new();
        runners
            .register(
                ["ping", "identifyProfile", "trackEvent"].map(TaskType::new),
                runner.clone(),
            )
            .unwrap();

        let queue = Queue::new(config, storage.clone(), runners, clock.clone());
        Harness {
            queue,
            storage,
            kv,
            clock,
            runner,
        }
    }

    fn server_error() -> RunError {
        RunError::Http(HttpError::UnsuccessfulStatus(500))
    }

    #[tokio::test]
    async fn runs_tasks_in_creation_order() {
        let h = harness(manual_config()).await;
        for payload in ["a", "b", "c"] {
            let added = h.queue.add_task("ping", payload, None, &[]).await;
            assert!(added.success);
        }

        let summary = h.queue.run().await;

        assert_eq!(h.runner.calls(), vec!["a", "b", "c"]);
        assert_eq!(summary.succeeded, 3);
        assert_eq!(h.queue.status().await.num_tasks_in_queue, 0);
    }

    #[tokio::test]
    async fn add_reports_queue_status() {
        let h = harness(manual_config()).await;
        h.queue.add_task("ping", "a", None, &[]).await;
        let added = h.queue.add_task("ping", "b", None, &[]).await;

        assert!(added.success);
        assert!(added.storage_id.is_some());
        assert_eq!(added.status, QueueStatus::new("test-site", 2));
    }

    #[tokio::test]
    async fn identify_then_track_with_transient_failures() {
        let h = harness(manual_config()).await;
        let profile = QueueTaskGroup::IdentifiedProfile("42".into());
        h.runner.fail("trackEvent", [server_error(), server_error()]);

        h.queue
            .add_task("identifyProfile", "identify", Some(profile.clone()), &[])
            .await;
        let track = h
            .queue
            .add_task("trackEvent", "track", None, &[profile])
            .await
            .storage_id
            .unwrap();

        // the child waits for the whole pass its anchor ran in
        let first = h.queue.run().await;
        assert_eq!(first.succeeded, 1);
        assert_eq!(first.skipped_blocked, 1);
        assert_eq!(h.queue.status().await.num_tasks_in_queue, 1);

        h.queue.run().await;
        h.queue.run().await;
        let task = h.storage.get(track).await.unwrap().unwrap();
        assert_eq!(task.run_results.total_runs, 2);

        let last = h.queue.run().await;
        assert_eq!(last.succeeded, 1);
        assert_eq!(h.queue.status().await.num_tasks_in_queue, 0);
        assert_eq!(
            h.runner.calls(),
            vec!["identify", "track", "track", "track"]
        );
    }

    #[tokio::test]
    async fn child_waits_while_anchor_keeps_failing() {
        let h = harness(manual_config()).await;
        let profile = QueueTaskGroup::IdentifiedProfile("7".into());
        h.runner
            .fail("identifyProfile", [server_error(), server_error()]);

        h.queue
            .add_task("identifyProfile", "identify", Some(profile.clone()), &[])
            .await;
        h.queue
            .add_task("trackEvent", "track", None, &[profile])
            .await;

        for _ in 0..2 {
            let summary = h.queue.run().await;
            assert_eq!(summary.retried, 1);
            assert_eq!(summary.skipped_blocked, 1);
        }
        assert_eq!(h.runner.calls(), vec!["identify", "identify"]);
    }

    #[tokio::test]
    async fn unrelated_tasks_are_not_blocked() {
        let h = harness(manual_config()).await;
        h.runner.fail("identifyProfile", [server_error()]);

        h.queue
            .add_task(
                "identifyProfile",
                "identify",
                Some(QueueTaskGroup::IdentifiedProfile("1".into())),
                &[],
            )
            .await;
        h.queue
            .add_task(
                "trackEvent",
                "other-profile",
                None,
                &[QueueTaskGroup::IdentifiedProfile("2".into())],
            )
            .await;

        let summary = h.queue.run().await;
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.skipped_blocked, 0);
    }

    #[tokio::test]
    async fn permanent_failure_drops_task() {
        let h = harness(manual_config()).await;
        h.runner
            .fail("ping", [RunError::Http(HttpError::UnsuccessfulStatus(400))]);
        h.queue.add_task("ping", "bad", None, &[]).await;

        let summary = h.queue.run().await;

        assert_eq!(summary.dropped, 1);
        assert_eq!(h.queue.status().await.num_tasks_in_queue, 0);
    }

    #[tokio::test]
    async fn no_response_halts_the_pass() {
        let h = harness(manual_config()).await;
        h.runner.fail(
            "ping",
            [RunError::Http(HttpError::NoResponse("offline".into()))],
        );
        let first = h
            .queue
            .add_task("ping", "a", None, &[])
            .await
            .storage_id
            .unwrap();
        h.queue.add_task("ping", "b", None, &[]).await;

        let summary = h.queue.run().await;

        assert!(summary.halted);
        assert_eq!(h.runner.calls(), vec!["a"]);
        assert_eq!(h.queue.status().await.num_tasks_in_queue, 2);
        let task = h.storage.get(first).await.unwrap().unwrap();
        assert_eq!(task.run_results.total_runs, 1);
    }

    #[tokio::test]
    async fn unhandled_type_stays_queued() {
        let h = harness(manual_config()).await;
        h.queue.add_task("inAppDismiss", "x", None, &[]).await;

        let summary = h.queue.run().await;

        assert_eq!(summary.unhandled, 1);
        assert_eq!(h.queue.status().await.num_tasks_in_queue, 1);
    }

    #[tokio::test]
    async fn unencodable_data_is_not_persisted() {
        struct Unencodable;
        impl Serialize for Unencodable {
            fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("not today"))
            }
        }

        let h = harness(manual_config()).await;
        let added = h.queue.add_task("ping", &Unencodable, None, &[]).await;

        assert!(!added.success);
        assert_eq!(added.storage_id, None);
        assert_eq!(added.status.num_tasks_in_queue, 0);
        assert!(h.kv.keys().is_empty());
    }

    #[tokio::test]
    async fn storage_failure_reports_unsuccessful_add() {
        let h = harness(manual_config()).await;
        h.kv.set_fail_writes(true);

        let added = h.queue.add_task("ping", "a", None, &[]).await;

        assert!(!added.success);
        assert_eq!(added.status.num_tasks_in_queue, 0);
    }

    #[tokio::test]
    async fn unreadable_body_is_removed_without_running() {
        let h = harness(manual_config()).await;
        let id = h
            .queue
            .add_task("ping", "a", None, &[])
            .await
            .storage_id
            .unwrap();
        h.kv.put_raw(&format!("tasks/{id}.json"), b"not json");

        let summary = h.queue.run().await;

        assert_eq!(summary.dropped, 1);
        assert!(h.runner.calls().is_empty());
        assert_eq!(h.queue.status().await.num_tasks_in_queue, 0);
    }

    #[tokio::test]
    async fn failed_body_read_keeps_the_task() {
        let h = harness(manual_config()).await;
        h.queue.add_task("ping", "a", None, &[]).await;

        h.kv.set_fail_reads(true);
        let summary = h.queue.run().await;
        assert_eq!(summary.unreadable, 1);
        assert_eq!(summary.dropped, 0);
        assert!(h.runner.calls().is_empty());
        assert_eq!(h.queue.status().await.num_tasks_in_queue, 1);

        h.kv.set_fail_reads(false);
        let summary = h.queue.run().await;
        assert_eq!(summary.succeeded, 1);
        assert_eq!(h.runner.calls(), vec!["a"]);
    }

    #[tokio::test]
    async fn expired_tasks_are_deleted_but_anchors_kept() {
        let h = harness(manual_config()).await;
        let old = h
            .queue
            .add_task("ping", "old", None, &[])
            .await
            .storage_id
            .unwrap();
        let anchor = h
            .queue
            .add_task(
                "identifyProfile",
                "anchor",
                Some(QueueTaskGroup::IdentifiedProfile("1".into())),
                &[],
            )
            .await
            .storage_id
            .unwrap();

        h.clock.advance(chrono::Duration::days(4));
        let fresh = h
            .queue
            .add_task("ping", "fresh", None, &[])
            .await
            .storage_id
            .unwrap();

        let deleted = h.queue.delete_expired_tasks().await;

        assert_eq!(deleted, vec![old]);
        let remaining: Vec<StorageId> = h
            .storage
            .inventory()
            .await
            .into_iter()
            .map(|m| m.task_persisted_id)
            .collect();
        assert_eq!(remaining, vec![anchor, fresh]);
    }

    #[tokio::test]
    async fn delete_task_removes_one_task() {
        let h = harness(manual_config()).await;
        let id = h
            .queue
            .add_task("ping", "a", None, &[])
            .await
            .storage_id
            .unwrap();

        assert!(h.queue.delete_task(id).await);
        assert!(h.queue.delete_task(id).await);
        assert_eq!(h.queue.status().await.num_tasks_in_queue, 0);
    }

    /// Blocks inside `run_task` until released; records payloads.
    #[derive(Default)]
    struct GatedRunner {
        entered: Notify,
        release: Notify,
        calls: Mutex<Vec<String>>,
    }

    impl GatedRunner {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl QueueRunner for GatedRunner {
        async fn run_task(&self, task: &QueueTask) -> Option<Result<(), RunError>> {
            let payload: String = serde_json::from_slice(&task.data).unwrap();
            self.calls.lock().unwrap().push(payload);
            self.entered.notify_one();
            self.release.notified().await;
            Some(Ok(()))
        }
    }

    async fn gated_queue(config: QueueConfig) -> (Queue, Arc<GatedRunner>) {
        let h = harness(manual_config()).await;
        let gated = Arc::new(GatedRunner::default());
        let mut runners = RunnerRegistry::new();
        runners.register([TaskType::new("slow")], gated.clone()).unwrap();
        let queue = Queue::new(config, h.storage.clone(), runners, h.clock.clone());
        (queue, gated)
    }

    #[tokio::test]
    async fn concurrent_runs_share_one_pass() {
        let (queue, gated) = gated_queue(manual_config()).await;
        queue.add_task("slow", "a", None, &[]).await;

        let first = tokio::spawn({
            let queue = queue.clone();
            async move { queue.run().await }
        });
        gated.entered.notified().await;
        assert!(queue.is_running());

        let (second, ()) = tokio::join!(queue.run(), async {
            gated.release.notify_one();
        });
        let first = first.await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.succeeded, 1);
        assert_eq!(gated.calls(), vec!["a"]);
        assert!(!queue.is_running());
    }

    #[tokio::test]
    async fn task_added_during_a_pass_gets_its_own_pass() {
        let (queue, gated) = gated_queue(QueueConfig {
            min_tasks_to_run: 1,
            ..manual_config()
        })
        .await;

        queue.add_task("slow", "a", None, &[]).await;
        gated.entered.notified().await;
        queue.add_task("slow", "b", None, &[]).await;
        gated.release.notify_one();

        gated.entered.notified().await;
        gated.release.notify_one();

        tokio::time::timeout(Duration::from_secs(5), async {
            while queue.status().await.num_tasks_in_queue > 0 || queue.is_running() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        assert_eq!(gated.calls(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn run_with_reports_summary() {
        let h = harness(manual_config()).await;
        h.queue.add_task("ping", "a", None, &[]).await;

        let (tx, rx) = tokio::sync::oneshot::channel();
        h.queue.run_with(move |summary| {
            let _ = tx.send(summary);
        });

        assert_eq!(rx.await.unwrap().succeeded, 1);
    }

    #[tokio::test]
    async fn add_starts_a_pass_once_threshold_reached() {
        let h = harness(QueueConfig {
            min_tasks_to_run: 2,
            ..manual_config()
        })
        .await;

        h.queue.add_task("ping", "a", None, &[]).await;
        tokio::task::yield_now().await;
        assert!(h.runner.calls().is_empty());

        h.queue.add_task("ping", "b", None, &[]).await;
        tokio::time::timeout(Duration::from_secs(5), async {
            while h.queue.status().await.num_tasks_in_queue > 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        assert_eq!(h.runner.calls(), vec!["a", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn below_threshold_runs_after_delay() {
        let h = harness(QueueConfig {
            min_tasks_to_run: 10,
            run_delay_secs: 30,
            ..manual_config()
        })
        .await;

        h.queue.add_task("ping", "a", None, &[]).await;
        h.queue.add_task("ping", "b", None, &[]).await;

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(h.queue.status().await.num_tasks_in_queue, 2);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(h.queue.status().await.num_tasks_in_queue, 0);
        assert_eq!(h.runner.calls(), vec!["a", "b"]);
    }
}
