//! Proptest strategies for statuses and booking timings

use booking_lifecycle::state_machine::BookingStatus;
use proptest::prelude::*;

pub fn status_strategy() -> impl Strategy<Value = BookingStatus> {
    prop::sample::select(BookingStatus::ALL.to_vec())
}

pub fn terminal_status_strategy() -> impl Strategy<Value = BookingStatus> {
    prop::sample::select(vec![
        BookingStatus::Completed,
        BookingStatus::NoShow,
        BookingStatus::Cancelled,
    ])
}

/// Statuses the automatic rules look at
pub fn auto_status_strategy() -> impl Strategy<Value = BookingStatus> {
    prop::sample::select(vec![
        BookingStatus::Scheduled,
        BookingStatus::Upcoming,
        BookingStatus::RunningLate,
    ])
}

/// Minutes from `now` to the booking start, roughly -3 days to +3 days
pub fn start_offset_strategy() -> impl Strategy<Value = i64> {
    -4320i64..=4320
}

/// Session length in minutes; short enough to never cross midnight from 09:00
pub fn duration_strategy() -> impl Strategy<Value = i64> {
    15i64..=180
}
