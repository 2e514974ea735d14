//! In-memory booking store
//!
//! Reference implementation of [`BookingStore`] used by tests and the demo binary.
//! Each CAS runs under the map's per-entry lock, so concurrent writers on the same
//! booking are serialised and exactly one of them observes the expected version.

use super::{BookingStore, CasOutcome, StoreError, StoreResult};
use crate::models::{Booking, NewBooking};
use crate::orchestration::{Clock, SystemClock};
use crate::state_machine::BookingStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug)]
pub struct InMemoryBookingStore {
    bookings: DashMap<Uuid, Booking>,
    available: AtomicBool,
    /// Fail `insert` only, leaving reads and CAS working
    reject_inserts: AtomicBool,
    /// Artificial delay applied to `list_active`
    list_latency: Mutex<Option<Duration>>,
    cas_attempts: AtomicU64,
    /// Stamps `created_at` on inserted bookings
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryBookingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            bookings: DashMap::new(),
            available: AtomicBool::new(true),
            reject_inserts: AtomicBool::new(false),
            list_latency: Mutex::new(None),
            cas_attempts: AtomicU64::new(0),
            clock,
        }
    }

    /// Put a booking in as-is, whatever its status and version
    pub fn seed(&self, booking: Booking) {
        self.bookings.insert(booking.id, booking);
    }

    /// Simulate an outage: every call fails with `Unavailable` while false
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn set_reject_inserts(&self, reject: bool) {
        self.reject_inserts.store(reject, Ordering::SeqCst);
    }

    pub fn set_list_latency(&self, latency: Option<Duration>) {
        *self.list_latency.lock() = latency;
    }

    pub fn cas_attempts(&self) -> u64 {
        self.cas_attempts.load(Ordering::Relaxed)
    }

    /// Every stored booking, frozen ones included
    pub fn snapshot(&self) -> Vec<Booking> {
        let mut bookings: Vec<Booking> = self.bookings.iter().map(|e| e.value().clone()).collect();
        bookings.sort_by_key(|b| (b.date, b.start_time, b.id));
        bookings
    }

    fn ensure_available(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::unavailable("in-memory store marked unavailable"))
        }
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn list_active(&self) -> StoreResult<Vec<Booking>> {
        let latency = *self.list_latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.ensure_available()?;

        let mut active: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|entry| entry.value().is_active())
            .map(|entry| entry.value().clone())
            .collect();
        active.sort_by_key(|b| (b.date, b.start_time, b.id));
        Ok(active)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        self.ensure_available()?;
        Ok(self.bookings.get(&id).map(|entry| entry.value().clone()))
    }

    async fn insert(&self, booking: NewBooking) -> StoreResult<Booking> {
        self.ensure_available()?;
        if self.reject_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("in-memory store rejecting inserts"));
        }
        booking
            .validate()
            .map_err(|reason| StoreError::InvalidBooking { reason })?;

        let booking = booking.into_booking(Uuid::new_v4(), self.clock.now());
        self.bookings.insert(booking.id, booking.clone());
        debug!(booking_id = %booking.id, "Booking inserted");
        Ok(booking)
    }

    async fn compare_and_swap_status(
        &self,
        id: Uuid,
        expected_version: u64,
        new_status: BookingStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<CasOutcome> {
        self.ensure_available()?;
        self.cas_attempts.fetch_add(1, Ordering::Relaxed);

        let Some(mut entry) = self.bookings.get_mut(&id) else {
            return Ok(CasOutcome::NotFound);
        };

        let booking = entry.value_mut();
        if booking.version != expected_version {
            return Ok(CasOutcome::VersionConflict {
                current_version: booking.version,
            });
        }

        booking.status = new_status;
        booking.version += 1;
        booking.last_transition_at = Some(at);
        Ok(CasOutcome::Applied(booking.clone()))
    }
}
