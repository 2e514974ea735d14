//! # Transition Log
//!
//! Append-only audit trail of applied transitions, keyed by booking. Records are
//! immutable once written and a booking's history is always returned ordered by
//! `(timestamp, version)`, which reproduces the order the store applied them in.

use crate::models::Transition;
use crate::state_machine::{
    BookingStatus, RejectionReason, TransitionError, TransitionResult, TransitionValidator,
};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct TransitionLog {
    entries: DashMap<Uuid, Vec<Transition>>,
    total: AtomicU64,
}

impl TransitionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transition to its booking's history
    pub fn record(&self, transition: Transition) {
        let key = (transition.timestamp, transition.version);
        let booking_id = transition.booking_id;

        let mut history = self.entries.entry(booking_id).or_default();
        let position = history.partition_point(|t| (t.timestamp, t.version) <= key);
        history.insert(position, transition);
        drop(history);

        self.total.fetch_add(1, Ordering::Relaxed);
        trace!(booking_id = %booking_id, "Transition recorded");
    }

    /// Ordered history of one booking; empty for unknown bookings
    pub fn history(&self, booking_id: Uuid) -> Vec<Transition> {
        self.entries
            .get(&booking_id)
            .map(|history| history.value().clone())
            .unwrap_or_default()
    }

    pub fn latest(&self, booking_id: Uuid) -> Option<Transition> {
        self.entries
            .get(&booking_id)
            .and_then(|history| history.value().last().cloned())
    }

    /// Replay a booking's history from `scheduled` through the validator,
    /// returning the status it ends in.
    ///
    /// Each record must start where the previous one ended; a missing record
    /// fails with [`RejectionReason::HistoryGap`], reported as `current -> from`.
    pub fn replay_path(
        &self,
        booking_id: Uuid,
        validator: &TransitionValidator,
    ) -> TransitionResult<BookingStatus> {
        self.history(booking_id)
            .iter()
            .try_fold(BookingStatus::Scheduled, |current, transition| {
                if transition.from != current {
                    return Err(TransitionError::new(
                        current,
                        transition.from,
                        RejectionReason::HistoryGap,
                    ));
                }
                validator.validate(transition.from, transition.to)?;
                Ok(transition.to)
            })
    }

    /// Total transitions recorded
    pub fn len(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn booking_count(&self) -> usize {
        self.entries.len()
    }
}
