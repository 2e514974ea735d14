//! # Constants
//!
//! Defaults and names shared across the lifecycle engine.

/// Configuration defaults
pub mod defaults {
    pub const TICK_INTERVAL_SECONDS: u64 = 60;
    pub const MAX_PASS_DEADLINE_SECONDS: u64 = 30;
    pub const WORKER_CONCURRENCY: usize = 8;
    pub const BACKOFF_INITIAL_SECONDS: u64 = 5;
    /// Ceiling for failed-pass backoff (5 minutes)
    pub const BACKOFF_MAX_SECONDS: u64 = 300;

    pub const UPCOMING_WINDOW_HOURS: u32 = 24;
    pub const LATE_GRACE_MINUTES: u32 = 10;

    pub const ALERT_DEDUPE_WINDOW_SECONDS: u64 = 300;
    pub const ALERT_TTL_SECONDS: u64 = 3600;
    pub const ALERT_PURGE_INTERVAL_SECONDS: u64 = 60;

    pub const EVENT_CHANNEL_CAPACITY: usize = 1024;
    pub const NOTIFIER_TIMEOUT_SECONDS: u64 = 10;
}

/// Configuration discovery
pub mod config_files {
    pub const BASE_NAME: &str = "booking-lifecycle";
    pub const ENV_PREFIX: &str = "BOOKING_LIFECYCLE";
    pub const ENVIRONMENT_VARIABLE: &str = "BOOKING_LIFECYCLE_ENV";
    pub const CONFIG_DIR_VARIABLE: &str = "BOOKING_LIFECYCLE_CONFIG_DIR";
    pub const DEFAULT_ENVIRONMENT: &str = "development";
}

/// Event names published for subscribers
pub mod events {
    pub const BOOKING_TRANSITIONED: &str = "booking.transitioned";
}
