// State machine module for the booking lifecycle
//
// Closed status set, transition table, legality checks and the time-driven
// automatic rules. Everything here is pure; I/O lives in `orchestration`.

pub mod errors;
pub mod guards;
pub mod registry;
pub mod rules;
pub mod states;

// Re-export main types for convenient access
pub use errors::{RejectionReason, TransitionError, TransitionResult};
pub use guards::TransitionValidator;
pub use registry::StatusRegistry;
pub use rules::{AutoRule, AutoTransition, AutoTransitionPolicy};
pub use states::{BookingStatus, StatusCategory};
