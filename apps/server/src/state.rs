//! State shared between the poll loop and the status server.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Liveness and counters written by the poller, read by `/health`.
#[derive(Debug, Default)]
pub struct PollerStatus {
    running: AtomicBool,
    /// Completed poll iterations, bootstrap included.
    polls: AtomicU64,
    /// Transfers reported.
    notifications: AtomicU64,
    /// Iterations that ended in an error or panic.
    failures: AtomicU64,
}

/// Shared handle to [`PollerStatus`].
pub type SharedStatus = Arc<PollerStatus>;

pub fn create_status() -> SharedStatus {
    Arc::new(PollerStatus::default())
}

impl PollerStatus {
    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn record_poll(&self) {
        self.polls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_notification(&self) {
        self.notifications.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn summary(&self) -> StatusSummary {
        StatusSummary {
            poller_running: self.is_running(),
            polls: self.polls.load(Ordering::Relaxed),
            notifications: self.notifications.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub poller_running: bool,
    pub polls: u64,
    pub notifications: u64,
    pub failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_starts_idle() {
        let status = create_status();
        assert!(!status.is_running());
        assert_eq!(
            status.summary(),
            StatusSummary {
                poller_running: false,
                polls: 0,
                notifications: 0,
                failures: 0,
            }
        );
    }

    #[test]
    fn test_status_counters() {
        let status = create_status();
        status.set_running(true);
        status.record_poll();
        status.record_poll();
        status.record_notification();
        status.record_failure();

        let summary = status.summary();
        assert!(summary.poller_running);
        assert_eq!(summary.polls, 2);
        assert_eq!(summary.notifications, 1);
        assert_eq!(summary.failures, 1);
    }
}
