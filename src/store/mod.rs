//! # Booking Store
//!
//! Boundary contract for the system of record. The store is the single source of
//! truth for booking status; the engine never caches status across passes and
//! every write goes through [`BookingStore::compare_and_swap_status`].

pub mod in_memory;

use crate::models::{Booking, NewBooking};
use crate::state_machine::BookingStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

pub use in_memory::InMemoryBookingStore;

/// Store-level failures
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Booking store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Invalid booking: {reason}")]
    InvalidBooking { reason: String },

    #[error("Booking store internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Result of a compare-and-swap status write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasOutcome {
    /// Write applied; carries the updated booking
    Applied(Booking),
    /// Stored version differed from the expected one
    VersionConflict { current_version: u64 },
    NotFound,
}

#[async_trait]
pub trait BookingStore: Send + Sync + fmt::Debug {
    /// All bookings that are neither terminal nor rescheduled
    async fn list_active(&self) -> StoreResult<Vec<Booking>>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<Booking>>;

    /// Create a booking in `scheduled`
    async fn insert(&self, booking: NewBooking) -> StoreResult<Booking>;

    /// Set `status` only if the stored version equals `expected_version`.
    /// On success the version is incremented and `last_transition_at` set to `at`.
    async fn compare_and_swap_status(
        &self,
        id: Uuid,
        expected_version: u64,
        new_status: BookingStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<CasOutcome>;
}
