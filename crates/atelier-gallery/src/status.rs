use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio::sync::watch;

/// Snapshot of the sync job as reported to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    pub is_syncing: bool,
    /// Attempted operations of the current or last run
    pub progress: u64,
    /// Operations scheduled for the current or last run
    pub total: u64,
    /// Attempted operations that failed
    pub failed: u64,
    pub message: String,
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self {
            is_syncing: false,
            progress: 0,
            total: 0,
            failed: 0,
            message: "not started".to_string(),
        }
    }
}

/// Owner of the sync status and the single-run guard
#[derive(Debug)]
pub struct SyncState {
    running: AtomicBool,
    status: watch::Sender<SyncStatus>,
}

impl Default for SyncState {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncState {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            status: watch::Sender::new(SyncStatus::default()),
        }
    }

    /// Current status; never waits for the running job
    pub fn snapshot(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Move from idle to syncing
    ///
    /// Returns `None` when a run is already in progress; the status is left
    /// untouched in that case.
    pub fn try_begin(self: &Arc<Self>) -> Option<SyncPermit> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;

        self.status.send_replace(SyncStatus {
            is_syncing: true,
            progress: 0,
            total: 0,
            failed: 0,
            message: "starting".to_string(),
        });

        Some(SyncPermit {
            state: Arc::clone(self),
        })
    }
}

/// Exclusive right to run a sync and write its status
///
/// Dropping the permit marks the run finished and releases the guard, whether
/// the run completed, failed or panicked.
#[derive(Debug)]
pub struct SyncPermit {
    state: Arc<SyncState>,
}

impl SyncPermit {
    /// Publish the number of scheduled operations and reset progress
    pub fn set_plan(&self, total: usize) {
        self.state.status.send_modify(|status| {
            status.total = u64::try_from(total).unwrap_or(u64::MAX);
            status.progress = 0;
            status.failed = 0;
        });
    }

    pub fn set_message(&self, message: impl Into<String>) {
        let message = message.into();
        self.state.status.send_modify(|status| status.message = message);
    }

    /// Count one attempted operation
    pub fn record(&self, message: impl Into<String>, success: bool) {
        let message = message.into();
        self.state.status.send_modify(|status| {
            status.progress += 1;
            if !success {
                status.failed += 1;
            }
            status.message = message;
        });
    }

    /// Record the terminal message of the run
    pub fn finish(self, message: impl Into<String>) {
        self.set_message(message);
    }
}

impl Drop for SyncPermit {
    fn drop(&mut self) {
        self.state.status.send_modify(|status| status.is_syncing = false);
        self.state.running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_status() {
        let state = SyncState::new();
        assert_eq!(
            state.snapshot(),
            SyncStatus {
                is_syncing: false,
                progress: 0,
                total: 0,
                failed: 0,
                message: "not started".to_string(),
            }
        );
    }

    #[test]
    fn second_begin_is_rejected() {
        let state = Arc::new(SyncState::new());

        let permit = state.try_begin().unwrap();
        permit.set_plan(3);
        permit.record("deleted a.jpg", true);

        assert!(state.try_begin().is_none());
        let status = state.snapshot();
        assert!(status.is_syncing);
        assert_eq!(status.progress, 1);
        assert_eq!(status.message, "deleted a.jpg");
    }

    #[test]
    fn begin_resets_previous_run() {
        let state = Arc::new(SyncState::new());

        let permit = state.try_begin().unwrap();
        permit.set_plan(2);
        permit.record("x", false);
        permit.finish("sync complete");

        let _permit = state.try_begin().unwrap();
        let status = state.snapshot();
        assert!(status.is_syncing);
        assert_eq!((status.progress, status.total, status.failed), (0, 0, 0));
        assert_eq!(status.message, "starting");
    }

    #[test]
    fn finish_releases_guard() {
        let state = Arc::new(SyncState::new());

        let permit = state.try_begin().unwrap();
        permit.set_plan(1);
        permit.record("downloaded a.jpg", true);
        permit.finish("sync complete");

        let status = state.snapshot();
        assert!(!status.is_syncing);
        assert_eq!(status.progress, 1);
        assert_eq!(status.total, 1);
        assert_eq!(status.message, "sync complete");
        assert!(!state.is_running());
        assert!(state.try_begin().is_some());
    }

    #[test]
    fn failures_are_counted_separately() {
        let state = Arc::new(SyncState::new());

        let permit = state.try_begin().unwrap();
        permit.set_plan(2);
        permit.record("a", false);
        permit.record("b", true);

        let status = state.snapshot();
        assert_eq!(status.progress, 2);
        assert_eq!(status.failed, 1);
    }

    #[test]
    fn panic_releases_guard() {
        let state = Arc::new(SyncState::new());
        let worker = Arc::clone(&state);

        let result = std::thread::spawn(move || {
            let _permit = worker.try_begin().unwrap();
            panic!("run crashed");
        })
        .join();

        assert!(result.is_err());
        assert!(!state.snapshot().is_syncing);
        assert!(!state.is_running());
    }

    #[tokio::test]
    async fn subscribers_see_updates() {
        let state = Arc::new(SyncState::new());
        let mut rx = state.subscribe();

        let permit = state.try_begin().unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_syncing);

        drop(permit);
        rx.changed().await.unwrap();
        assert!(!rx.borrow().is_syncing);
    }
}
