use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared between the pool and its workers.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    submitted: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    cancelled: AtomicU64,
}

impl Counters {
    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    // Submissions are counted before the handoff, so a rejected handoff takes its count back.
    pub(crate) fn record_rejected(&self) {
        self.submitted.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn record_succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> PoolStats {
        PoolStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of the task counters of a [`Pool`][crate::Pool].
///
/// The counters are updated independently, so a snapshot taken while tasks are running may
/// momentarily show a task as submitted but not yet finished.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    submitted: u64,
    succeeded: u64,
    failed: u64,
    cancelled: u64,
}

impl PoolStats {
    /// Tasks accepted by the pool. Rejected submissions are not counted.
    #[must_use]
    pub fn submitted(&self) -> u64 {
        self.submitted
    }

    /// Tasks that ran and produced a value.
    #[must_use]
    pub fn succeeded(&self) -> u64 {
        self.succeeded
    }

    /// Tasks that ran and panicked or returned an error.
    #[must_use]
    pub fn failed(&self) -> u64 {
        self.failed
    }

    /// Tasks skipped because they were cancelled before a worker claimed them.
    #[must_use]
    pub fn cancelled(&self) -> u64 {
        self.cancelled
    }

    /// Tasks that have been accepted but not yet finished or skipped.
    #[must_use]
    pub fn pending(&self) -> u64 {
        self.submitted
            .saturating_sub(self.succeeded)
            .saturating_sub(self.failed)
            .saturating_sub(self.cancelled)
    }
}
