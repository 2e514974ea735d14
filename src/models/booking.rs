//! # Booking Model
//!
//! A booking as seen by the lifecycle engine. Creation and deletion belong to the
//! surrounding application; the engine only reads bookings and swaps their status.

use crate::state_machine::BookingStatus;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub client_id: String,
    pub therapy_type: String,
    /// Practice-local calendar date
    pub date: NaiveDate,
    /// Practice-local wall-clock start
    pub start_time: NaiveTime,
    /// Practice-local wall-clock end, after `start_time`
    pub end_time: NaiveTime,
    pub status: BookingStatus,
    /// Bumped by every successful compare-and-swap
    pub version: u64,
    pub last_transition_at: Option<DateTime<Utc>>,
    /// Booking this one replaces after a reschedule
    pub rescheduled_from: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Start and end of a booking in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Booking {
    /// Resolve the practice-local date and times against a fixed UTC offset
    pub fn window(&self, utc_offset: FixedOffset) -> BookingWindow {
        BookingWindow {
            start: to_utc(self.date, self.start_time, utc_offset),
            end: to_utc(self.date, self.end_time, utc_offset),
        }
    }

    /// Still eligible for transitions
    pub fn is_active(&self) -> bool {
        !self.status.is_frozen()
    }
}

fn to_utc(date: NaiveDate, time: NaiveTime, utc_offset: FixedOffset) -> DateTime<Utc> {
    let local = NaiveDateTime::new(date, time);
    (local - Duration::seconds(i64::from(utc_offset.local_minus_utc()))).and_utc()
}

/// Fields supplied by the caller when a booking is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    pub client_id: String,
    pub therapy_type: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub rescheduled_from: Option<Uuid>,
}

impl NewBooking {
    pub fn new(
        client_id: impl Into<String>,
        therapy_type: impl Into<String>,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            therapy_type: therapy_type.into(),
            date,
            start_time,
            end_time,
            rescheduled_from: None,
        }
    }

    pub fn rescheduled_from(mut self, booking_id: Uuid) -> Self {
        self.rescheduled_from = Some(booking_id);
        self
    }

    /// Reject bookings whose end does not follow their start
    pub fn validate(&self) -> Result<(), String> {
        if self.end_time <= self.start_time {
            return Err(format!(
                "end time {} must be after start time {}",
                self.end_time, self.start_time
            ));
        }
        if self.client_id.trim().is_empty() {
            return Err("client_id must not be empty".to_string());
        }
        Ok(())
    }

    /// Materialise as a fresh `scheduled` booking
    pub fn into_booking(self, id: Uuid, created_at: DateTime<Utc>) -> Booking {
        Booking {
            id,
            client_id: self.client_id,
            therapy_type: self.therapy_type,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            status: BookingStatus::default(),
            version: 0,
            last_transition_at: None,
            rescheduled_from: self.rescheduled_from,
            created_at,
        }
    }
}

/// Booking counts per status, every status present
pub fn status_summary(bookings: &[Booking]) -> BTreeMap<BookingStatus, usize> {
    let mut summary: BTreeMap<BookingStatus, usize> =
        BookingStatus::ALL.iter().map(|status| (*status, 0)).collect();

    for booking in bookings {
        *summary.entry(booking.status).or_default() += 1;
    }

    summary
}
