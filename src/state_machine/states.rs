use serde::{Deserialize, Serialize};
use std::fmt;

/// Booking status definitions for the practice booking lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Initial state when a booking is created
    Scheduled,
    /// Client has confirmed attendance
    ConfirmedClient,
    /// A reminder was delivered to the client
    ReminderSent,
    /// Booking starts within the upcoming window
    Upcoming,
    /// Client is in the waiting room
    ClientArrived,
    /// Session is underway
    InSession,
    /// Start time passed the grace period without the client arriving
    RunningLate,
    /// Session completed
    Completed,
    /// Client never showed up
    NoShow,
    /// Booking was cancelled
    Cancelled,
    /// Booking was moved; a new booking carries the follow-up
    Rescheduled,
}

/// Semantic grouping used by dashboards and alert priorities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCategory {
    PreSession,
    DayOf,
    Terminal,
    Special,
}

impl BookingStatus {
    /// Every status in registry order
    pub const ALL: [BookingStatus; 11] = [
        Self::Scheduled,
        Self::ConfirmedClient,
        Self::ReminderSent,
        Self::Upcoming,
        Self::ClientArrived,
        Self::InSession,
        Self::RunningLate,
        Self::Completed,
        Self::NoShow,
        Self::Cancelled,
        Self::Rescheduled,
    ];

    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::NoShow | Self::Cancelled)
    }

    /// Terminal or superseded by a reschedule; frozen bookings are never scanned
    pub fn is_frozen(&self) -> bool {
        self.is_terminal() || matches!(self, Self::Rescheduled)
    }

    pub fn category(&self) -> StatusCategory {
        match self {
            Self::Scheduled | Self::ConfirmedClient | Self::ReminderSent => {
                StatusCategory::PreSession
            }
            Self::Upcoming | Self::ClientArrived | Self::InSession | Self::RunningLate => {
                StatusCategory::DayOf
            }
            Self::Completed | Self::NoShow | Self::Cancelled => StatusCategory::Terminal,
            Self::Rescheduled => StatusCategory::Special,
        }
    }

    /// Human-facing label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::ConfirmedClient => "Confirmed by client",
            Self::ReminderSent => "Reminder sent",
            Self::Upcoming => "Upcoming",
            Self::ClientArrived => "Client arrived",
            Self::InSession => "In session",
            Self::RunningLate => "Running late",
            Self::Completed => "Completed",
            Self::NoShow => "No show",
            Self::Cancelled => "Cancelled",
            Self::Rescheduled => "Rescheduled",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Scheduled => "Booking created and scheduled",
            Self::ConfirmedClient => "Client has confirmed attendance",
            Self::ReminderSent => "Reminder sent to the client",
            Self::Upcoming => "Booking is today or coming up soon",
            Self::ClientArrived => "Client has arrived and is waiting",
            Self::InSession => "Session in progress",
            Self::RunningLate => "Client is late",
            Self::Completed => "Session completed successfully",
            Self::NoShow => "Client did not show up",
            Self::Cancelled => "Booking cancelled",
            Self::Rescheduled => "Booking has been rescheduled",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::ConfirmedClient => "confirmed_client",
            Self::ReminderSent => "reminder_sent",
            Self::Upcoming => "upcoming",
            Self::ClientArrived => "client_arrived",
            Self::InSession => "in_session",
            Self::RunningLate => "running_late",
            Self::Completed => "completed",
            Self::NoShow => "no_show",
            Self::Cancelled => "cancelled",
            Self::Rescheduled => "rescheduled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Invalid booking status: {s}"))
    }
}

/// Default state for new bookings
impl Default for BookingStatus {
    fn default() -> Self {
        Self::Scheduled
    }
}
