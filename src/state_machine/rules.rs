//! # Automatic Transition Rules
//!
//! Pure time-based rules mapping a booking snapshot and the current instant to the
//! next status the scheduler should apply. Rules are checked in priority order and
//! the first match wins. `now` is always a parameter; nothing here reads a clock.
//!
//! Manual statuses (`client_arrived`, `in_session`, `completed`, `confirmed_client`,
//! `reminder_sent`, `cancelled`) are never produced here.

use super::states::BookingStatus;
use crate::config::{ConfigResult, ConfigurationError, PolicyConfig};
use crate::models::Booking;
use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Automatic rules in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoRule {
    /// `scheduled` and the start is within the upcoming window
    WithinUpcomingWindow,
    /// `scheduled` and the start already passed (promotion was missed)
    MissedUpcomingWindow,
    /// `upcoming` and the client is later than the grace period
    LateArrival,
    /// `upcoming` or `running_late` once the session window is over
    SessionWindowElapsed,
}

impl AutoRule {
    pub const ALL: [AutoRule; 4] = [
        Self::WithinUpcomingWindow,
        Self::MissedUpcomingWindow,
        Self::LateArrival,
        Self::SessionWindowElapsed,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::WithinUpcomingWindow => "within_upcoming_window",
            Self::MissedUpcomingWindow => "missed_upcoming_window",
            Self::LateArrival => "late_arrival",
            Self::SessionWindowElapsed => "session_window_elapsed",
        }
    }

    pub fn target(&self) -> BookingStatus {
        match self {
            Self::WithinUpcomingWindow | Self::MissedUpcomingWindow => BookingStatus::Upcoming,
            Self::LateArrival => BookingStatus::RunningLate,
            Self::SessionWindowElapsed => BookingStatus::NoShow,
        }
    }

    /// Registry edges this rule can emit
    pub fn edges(&self) -> &'static [(BookingStatus, BookingStatus)] {
        use BookingStatus::*;
        match self {
            Self::WithinUpcomingWindow | Self::MissedUpcomingWindow => &[(Scheduled, Upcoming)],
            Self::LateArrival => &[(Upcoming, RunningLate)],
            Self::SessionWindowElapsed => &[(Upcoming, NoShow), (RunningLate, NoShow)],
        }
    }

    /// Audit reason recorded with the transition
    pub fn reason(&self) -> &'static str {
        match self {
            Self::WithinUpcomingWindow => "automatic update: booking starts within the upcoming window",
            Self::MissedUpcomingWindow => "automatic update: start time passed while still scheduled",
            Self::LateArrival => "automatic update: client not arrived after grace period",
            Self::SessionWindowElapsed => "automatic update: booking window ended without attendance",
        }
    }
}

/// A rule that fired for a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoTransition {
    pub to: BookingStatus,
    pub rule: AutoRule,
}

/// Time thresholds for the automatic rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoTransitionPolicy {
    upcoming_window: Duration,
    late_grace: Duration,
    utc_offset: FixedOffset,
}

impl AutoTransitionPolicy {
    pub fn new(upcoming_window: Duration, late_grace: Duration, utc_offset: FixedOffset) -> Self {
        Self {
            upcoming_window,
            late_grace,
            utc_offset,
        }
    }

    pub fn from_config(config: &PolicyConfig) -> ConfigResult<Self> {
        let utc_offset = FixedOffset::east_opt(config.utc_offset_minutes * 60).ok_or_else(|| {
            ConfigurationError::invalid_value(
                "policy.utc_offset_minutes",
                config.utc_offset_minutes.to_string(),
                "offset must be within +/- 24 hours",
            )
        })?;

        Ok(Self::new(
            Duration::hours(i64::from(config.upcoming_window_hours)),
            Duration::minutes(i64::from(config.late_grace_minutes)),
            utc_offset,
        ))
    }

    pub fn upcoming_window(&self) -> Duration {
        self.upcoming_window
    }

    pub fn late_grace(&self) -> Duration {
        self.late_grace
    }

    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset
    }

    /// Next automatic status for `booking` at `now`, if any rule fires
    pub fn next_auto_status(&self, booking: &Booking, now: DateTime<Utc>) -> Option<BookingStatus> {
        self.evaluate(booking, now).map(|auto| auto.to)
    }

    /// First rule (in priority order) that fires for `booking` at `now`
    pub fn evaluate(&self, booking: &Booking, now: DateTime<Utc>) -> Option<AutoTransition> {
        if booking.status.is_frozen() {
            return None;
        }

        AutoRule::ALL
            .into_iter()
            .find(|rule| self.fires(*rule, booking, now))
            .map(|rule| AutoTransition {
                to: rule.target(),
                rule,
            })
    }

    fn fires(&self, rule: AutoRule, booking: &Booking, now: DateTime<Utc>) -> bool {
        let window = booking.window(self.utc_offset);
        let until_start = window.start - now;

        match rule {
            AutoRule::WithinUpcomingWindow => {
                booking.status == BookingStatus::Scheduled
                    && until_start > Duration::zero()
                    && until_start <= self.upcoming_window
            }
            AutoRule::MissedUpcomingWindow => {
                booking.status == BookingStatus::Scheduled && until_start <= Duration::zero()
            }
            AutoRule::LateArrival => {
                booking.status == BookingStatus::Upcoming
                    && window.start <= now
                    && now < window.end
                    && now - window.start > self.late_grace
            }
            AutoRule::SessionWindowElapsed => {
                matches!(
                    booking.status,
                    BookingStatus::Upcoming | BookingStatus::RunningLate
                ) && now >= window.end
            }
        }
    }
}

impl Default for AutoTransitionPolicy {
    fn default() -> Self {
        Self::new(
            Duration::hours(24),
            Duration::minutes(10),
            Utc.fix(),
        )
    }
}
