#![allow(clippy::doc_markdown)] // Allow technical terms in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Booking Lifecycle
//!
//! Lifecycle engine for therapy-practice bookings.
//!
//! ## Overview
//!
//! Every booking moves through a closed set of statuses, from `scheduled` to one of
//! `completed`, `no_show` or `cancelled`. Some moves are driven by time (a session
//! coming up, a client running late, a window passing with nobody turning up); the
//! rest are made by staff. This crate owns the rules for both and guarantees that
//! every stored status change is a legal edge, written exactly once.
//!
//! ## Module Organization
//!
//! - [`state_machine`] - Status set, transition table, validator and automatic rules
//! - [`models`] - Bookings and transition records
//! - [`store`] - Booking store contract and in-memory implementation
//! - [`orchestration`] - Transition service, scheduler, bootstrap
//! - [`audit`] - Append-only transition log
//! - [`alerts`] - Dashboard alerts derived from transitions
//! - [`events`] - Transition event fan-out
//! - [`notifier`] - Outbound notification contract
//! - [`config`] - YAML + environment configuration
//! - [`logging`] - Structured logging setup and helpers
//! - [`error`] - Crate-level error type
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use booking_lifecycle::config::ConfigManager;
//! use booking_lifecycle::notifier::TracingNotifier;
//! use booking_lifecycle::orchestration::{LifecycleSystem, SystemClock};
//! use booking_lifecycle::store::InMemoryBookingStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> booking_lifecycle::Result<()> {
//! booking_lifecycle::logging::init_structured_logging();
//!
//! let system = LifecycleSystem::bootstrap(
//!     ConfigManager::load_or_default()?,
//!     Arc::new(InMemoryBookingStore::new()),
//!     Arc::new(TracingNotifier),
//!     Arc::new(SystemClock),
//! )?;
//! system.start()?;
//! # Ok(())
//! # }
//! ```

pub mod alerts;
pub mod audit;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod notifier;
pub mod orchestration;
pub mod state_machine;
pub mod store;

pub use alerts::{Alert, AlertAggregator, AlertPriority};
pub use audit::TransitionLog;
pub use config::{ConfigManager, LifecycleConfig};
pub use error::{LifecycleError, Result};
pub use events::{BookingTransitioned, EventPublisher};
pub use models::{status_summary, Booking, NewBooking, Transition, TriggeredBy};
pub use notifier::{NotificationChannel, Notifier, NotifierError, TracingNotifier};
pub use orchestration::{
    BookingStatusScheduler, Clock, LifecycleSystem, ManualClock, ManualTransitionRequest,
    RescheduleRequest, SystemClock, TransitionService, TransitionServiceError,
};
pub use state_machine::{
    AutoTransitionPolicy, BookingStatus, StatusRegistry, TransitionError, TransitionValidator,
};
pub use store::{BookingStore, CasOutcome, InMemoryBookingStore, StoreError};
