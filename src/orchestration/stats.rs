//! Scheduler counters.
//!
//! Plain atomics updated from the driver and worker tasks; read through a
//! serializable snapshot.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct SchedulerStats {
    passes_completed: AtomicU64,
    passes_failed: AtomicU64,
    bookings_examined: AtomicU64,
    transitions_applied: AtomicU64,
    version_conflicts: AtomicU64,
    rejections: AtomicU64,
    booking_failures: AtomicU64,
    deferred: AtomicU64,
}

/// Point-in-time copy of [`SchedulerStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerStatsSnapshot {
    pub passes_completed: u64,
    pub passes_failed: u64,
    pub bookings_examined: u64,
    pub transitions_applied: u64,
    pub version_conflicts: u64,
    pub rejections: u64,
    pub booking_failures: u64,
    pub deferred: u64,
}

impl SchedulerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_pass_completed(&self) {
        self.passes_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pass_failed(&self) {
        self.passes_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_examined(&self, count: u64) {
        self.bookings_examined.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_transition(&self) {
        self.transitions_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_conflict(&self) {
        self.version_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejection(&self) {
        self.rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_booking_failure(&self) {
        self.booking_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_deferred(&self, count: u64) {
        self.deferred.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SchedulerStatsSnapshot {
        SchedulerStatsSnapshot {
            passes_completed: self.passes_completed.load(Ordering::Relaxed),
            passes_failed: self.passes_failed.load(Ordering::Relaxed),
            bookings_examined: self.bookings_examined.load(Ordering::Relaxed),
            transitions_applied: self.transitions_applied.load(Ordering::Relaxed),
            version_conflicts: self.version_conflicts.load(Ordering::Relaxed),
            rejections: self.rejections.load(Ordering::Relaxed),
            booking_failures: self.booking_failures.load(Ordering::Relaxed),
            deferred: self.deferred.load(Ordering::Relaxed),
        }
    }
}
