//! # Orchestration
//!
//! The moving parts of the lifecycle engine: the single transition write path,
//! the periodic scheduler, event subscribers and the bootstrap that wires them.
//!
//! ## Core Components
//!
//! - **TransitionService**: validate, compare-and-swap, record, publish
//! - **BookingStatusScheduler**: periodic passes applying the automatic rules
//! - **NotificationDispatcher**: forwards automatic changes to the notifier
//! - **LifecycleSystem**: builds and owns everything above

pub mod bootstrap;
pub mod clock;
pub mod notification_dispatcher;
pub mod scheduler;
pub mod stats;
pub mod transition_service;

pub use bootstrap::{LifecycleSystem, SystemStatus};
pub use clock::{Clock, ManualClock, SystemClock};
pub use notification_dispatcher::NotificationDispatcher;
pub use scheduler::{
    Backoff, BookingOutcome, BookingStatusScheduler, HaltReason, PassReport, SchedulerError,
    SchedulerState,
};
pub use stats::{SchedulerStats, SchedulerStatsSnapshot};
pub use transition_service::{
    AppliedTransition, ApplyOutcome, ManualTransitionRequest, RescheduleOutcome,
    RescheduleRequest, ServiceResult, TransitionService, TransitionServiceError,
};
