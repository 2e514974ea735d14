//! # Models
//!
//! Domain values shared by the lifecycle components.

pub mod booking;
pub mod transition;

pub use booking::{status_summary, Booking, BookingWindow, NewBooking};
pub use transition::{Transition, TriggeredBy};
