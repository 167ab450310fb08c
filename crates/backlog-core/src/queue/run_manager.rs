//! RunManager - 実行要求の合流（同時に走るパスは最大 1 本）
//!
//! # 学習ポイント
//! - 実行中に来た `run()` は同じパスの結果を待つ
//! - パス中に追加された task は開始時スナップショットに入らないので、
//!   `register_followup()` で次のパスを予約する

use std::sync::Mutex;

use tokio::sync::oneshot;

use super::run_request::RunSummary;

#[derive(Default)]
struct RunManagerState {
    running: bool,
    waiters: Vec<oneshot::Sender<RunSummary>>,
    rerun_requested: bool,
    next_waiters: Vec<oneshot::Sender<RunSummary>>,
}

/// Tracks whether a pass is active and who is waiting for it.
#[derive(Default)]
pub(crate) struct RunManager {
    state: Mutex<RunManagerState>,
}

impl RunManager {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Join the active pass, or start one. `true` means the caller must start
    /// the pass.
    pub(crate) fn register(&self) -> (bool, oneshot::Receiver<RunSummary>) {
        let (tx, rx) = oneshot::channel();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.waiters.push(tx);
        let start = !state.running;
        state.running = true;
        (start, rx)
    }

    /// Like `register`, but while a pass is active the caller waits for the
    /// pass after it, which the active driver runs once it finishes.
    pub(crate) fn register_followup(&self) -> (bool, oneshot::Receiver<RunSummary>) {
        let (tx, rx) = oneshot::channel();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !state.running {
            state.running = true;
            state.waiters.push(tx);
            return (true, rx);
        }
        state.rerun_requested = true;
        state.next_waiters.push(tx);
        (false, rx)
    }

    /// Wake the waiters of the finished pass.
    ///
    /// Returns `true` when a follow-up pass was requested; the driver stays
    /// the owner and must run it.
    pub(crate) fn finish(&self, summary: RunSummary) -> bool {
        let (waiters, rerun) = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            let waiters = std::mem::take(&mut state.waiters);
            let rerun = std::mem::take(&mut state.rerun_requested);
            if rerun {
                state.waiters = std::mem::take(&mut state.next_waiters);
            } else {
                state.running = false;
            }
            (waiters, rerun)
        };
        for waiter in waiters {
            // receiver may have given up waiting
            let _ = waiter.send(summary.clone());
        }
        rerun
    }

    /// Drop every waiter without a summary and mark the manager idle.
    pub(crate) fn abandon(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *state = RunManagerState::default();
    }

    pub(crate) fn is_running(&self) -> bool {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).running
    }
}
