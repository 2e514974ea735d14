//! # Events
//!
//! In-process fan-out of applied transitions to the alert aggregator, the
//! notification dispatcher and any external subscriber.

pub mod publisher;
pub mod types;

pub use publisher::EventPublisher;
pub use types::BookingTransitioned;
