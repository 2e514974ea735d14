//! # Booking Lifecycle Configuration
//!
//! Typed configuration for the scheduler, the automatic-transition policy, alerting,
//! event fan-out and notification delivery.
//!
//! ## Sources
//!
//! - `config/booking-lifecycle.yaml`: base settings
//! - `config/booking-lifecycle.{environment}.yaml`: optional environment overlay
//! - `BOOKING_LIFECYCLE__<SECTION>__<KEY>` environment variables
//!
//! Every field has a default, so a section may be omitted entirely.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use booking_lifecycle::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let tick = manager.config().scheduler.tick_interval();
//! let registry = manager.config().registry()?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::constants::defaults;
use crate::notifier::NotificationChannel;
use crate::state_machine::StatusRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure mirroring booking-lifecycle.yaml
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Periodic scan settings
    pub scheduler: SchedulerConfig,

    /// Thresholds for the automatic rules
    pub policy: PolicyConfig,

    /// Alert de-duplication and expiry
    pub alerts: AlertConfig,

    /// Event fan-out settings
    pub events: EventsConfig,

    /// Notification delivery settings
    pub notifications: NotificationConfig,

    /// Optional override of the status transition table (`status: [successors]`)
    pub transitions: Option<BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub tick_interval_seconds: u64,
    pub max_pass_deadline_seconds: u64,
    pub worker_concurrency: usize,
    pub backoff_initial_seconds: u64,
    pub backoff_max_seconds: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_seconds: defaults::TICK_INTERVAL_SECONDS,
            max_pass_deadline_seconds: defaults::MAX_PASS_DEADLINE_SECONDS,
            worker_concurrency: defaults::WORKER_CONCURRENCY,
            backoff_initial_seconds: defaults::BACKOFF_INITIAL_SECONDS,
            backoff_max_seconds: defaults::BACKOFF_MAX_SECONDS,
        }
    }
}

impl SchedulerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_seconds)
    }

    pub fn max_pass_deadline(&self) -> Duration {
        Duration::from_secs(self.max_pass_deadline_seconds)
    }

    pub fn backoff_initial(&self) -> Duration {
        Duration::from_secs(self.backoff_initial_seconds)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_secs(self.backoff_max_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// How far ahead a scheduled booking is promoted to upcoming
    pub upcoming_window_hours: u32,
    /// Minutes after start before an upcoming booking counts as running late
    pub late_grace_minutes: u32,
    /// Practice-local offset from UTC used to resolve booking times
    pub utc_offset_minutes: i32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            upcoming_window_hours: defaults::UPCOMING_WINDOW_HOURS,
            late_grace_minutes: defaults::LATE_GRACE_MINUTES,
            utc_offset_minutes: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AlertConfig {
    pub dedupe_window_seconds: u64,
    /// Lifetime of alerts for non-terminal statuses
    pub ttl_seconds: u64,
    /// How often expired and acknowledged alerts are dropped from memory
    pub purge_interval_seconds: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            dedupe_window_seconds: defaults::ALERT_DEDUPE_WINDOW_SECONDS,
            ttl_seconds: defaults::ALERT_TTL_SECONDS,
            purge_interval_seconds: defaults::ALERT_PURGE_INTERVAL_SECONDS,
        }
    }
}

impl AlertConfig {
    pub fn dedupe_window(&self) -> Duration {
        Duration::from_secs(self.dedupe_window_seconds)
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EventsConfig {
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: defaults::EVENT_CHANNEL_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Channel for transition notices
    pub default_channel: NotificationChannel,
    /// Channel used by `send_reminder`
    pub reminder_channel: NotificationChannel,
    pub timeout_seconds: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            default_channel: NotificationChannel::InApp,
            reminder_channel: NotificationChannel::Sms,
            timeout_seconds: defaults::NOTIFIER_TIMEOUT_SECONDS,
        }
    }
}

impl NotificationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl LifecycleConfig {
    /// Validate configuration values before anything starts
    pub fn validate(&self) -> ConfigResult<()> {
        if self.scheduler.tick_interval_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "scheduler.tick_interval_seconds",
                "0",
                "tick interval must be greater than 0",
            ));
        }

        if self.scheduler.max_pass_deadline_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "scheduler.max_pass_deadline_seconds",
                "0",
                "pass deadline must be greater than 0",
            ));
        }

        if self.scheduler.worker_concurrency == 0 {
            return Err(ConfigurationError::invalid_value(
                "scheduler.worker_concurrency",
                "0",
                "worker concurrency must be greater than 0",
            ));
        }

        if self.scheduler.backoff_initial_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "scheduler.backoff_initial_seconds",
                "0",
                "initial backoff must be greater than 0",
            ));
        }

        if self.scheduler.backoff_max_seconds < self.scheduler.backoff_initial_seconds {
            return Err(ConfigurationError::invalid_value(
                "scheduler.backoff_max_seconds",
                self.scheduler.backoff_max_seconds.to_string(),
                "backoff ceiling must not be below the initial backoff",
            ));
        }

        if self.policy.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(ConfigurationError::invalid_value(
                "policy.utc_offset_minutes",
                self.policy.utc_offset_minutes.to_string(),
                "offset must be within +/- 24 hours",
            ));
        }

        if self.alerts.purge_interval_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "alerts.purge_interval_seconds",
                "0",
                "purge interval must be greater than 0",
            ));
        }

        if self.events.channel_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "events.channel_capacity",
                "0",
                "channel capacity must be greater than 0",
            ));
        }

        // Fails fast on a malformed transition table
        self.registry()?;

        Ok(())
    }

    /// Build the status registry, honouring a configured override
    pub fn registry(&self) -> ConfigResult<StatusRegistry> {
        match &self.transitions {
            Some(table) => StatusRegistry::from_table(table),
            None => Ok(StatusRegistry::standard()),
        }
    }
}
