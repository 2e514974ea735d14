//! # Alert Aggregator
//!
//! Turns transition events into human-facing alerts for the practice dashboard.
//!
//! - One alert per `(booking_id, to_status)` within the dedupe window, measured on
//!   event timestamps rather than arrival time.
//! - Alerts for terminal statuses never expire; they stay until acknowledged.
//! - Other alerts expire after the ttl, or as soon as the booking moves on.
//! - While running as a subscriber, inactive alerts and stale dedupe entries are
//!   purged every `purge_interval`.
//!
//! Alerts are derived data. Losing or delaying one never affects booking status.

use crate::config::{AlertConfig, ConfigResult, ConfigurationError};
use crate::constants::defaults;
use crate::events::BookingTransitioned;
use crate::orchestration::Clock;
use crate::state_machine::BookingStatus;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertPriority {
    Low,
    Normal,
    High,
}

impl AlertPriority {
    pub fn for_status(status: BookingStatus) -> Self {
        match status {
            BookingStatus::RunningLate | BookingStatus::NoShow => Self::High,
            BookingStatus::Cancelled | BookingStatus::Rescheduled | BookingStatus::ClientArrived => {
                Self::Normal
            }
            _ => Self::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub status: BookingStatus,
    pub message: String,
    pub priority: AlertPriority,
    pub created_at: DateTime<Utc>,
    /// `None` for terminal statuses
    pub expires_at: Option<DateTime<Utc>>,
    pub acknowledged: bool,
}

impl Alert {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.acknowledged && self.expires_at.map_or(true, |expires_at| now < expires_at)
    }
}

#[derive(Debug, Default)]
struct AlertState {
    alerts: Vec<Alert>,
    /// Last raise time per (booking, status)
    last_raised: HashMap<(Uuid, BookingStatus), DateTime<Utc>>,
}

#[derive(Debug)]
pub struct AlertAggregator {
    dedupe_window: Duration,
    ttl: Duration,
    purge_interval: StdDuration,
    state: RwLock<AlertState>,
}

impl Default for AlertAggregator {
    fn default() -> Self {
        Self::new(Duration::minutes(5), Duration::hours(1))
    }
}

impl AlertAggregator {
    pub fn new(dedupe_window: Duration, ttl: Duration) -> Self {
        Self {
            dedupe_window,
            ttl,
            purge_interval: StdDuration::from_secs(defaults::ALERT_PURGE_INTERVAL_SECONDS),
            state: RwLock::new(AlertState::default()),
        }
    }

    pub fn with_purge_interval(mut self, purge_interval: StdDuration) -> Self {
        self.purge_interval = purge_interval;
        self
    }

    /// Alerts held in memory, active or not
    pub fn retained(&self) -> usize {
        self.state.read().alerts.len()
    }

    pub fn from_config(config: &AlertConfig) -> ConfigResult<Self> {
        let dedupe_window = Duration::from_std(config.dedupe_window()).map_err(|_| {
            ConfigurationError::invalid_value(
                "alerts.dedupe_window_seconds",
                config.dedupe_window_seconds.to_string(),
                "window out of range",
            )
        })?;
        let ttl = Duration::from_std(config.ttl()).map_err(|_| {
            ConfigurationError::invalid_value(
                "alerts.ttl_seconds",
                config.ttl_seconds.to_string(),
                "ttl out of range",
            )
        })?;
        Ok(Self::new(dedupe_window, ttl).with_purge_interval(config.purge_interval()))
    }

    /// Fold one transition event in, returning any newly raised alerts
    pub fn on_transition(&self, event: &BookingTransitioned) -> Vec<Alert> {
        let mut state = self.state.write();

        // The booking moved on, so older non-terminal alerts no longer apply
        for alert in state.alerts.iter_mut().filter(|a| {
            a.booking_id == event.booking_id && a.status != event.to && a.expires_at.is_some()
        }) {
            if alert.expires_at.is_some_and(|expires_at| expires_at > event.timestamp) {
                alert.expires_at = Some(event.timestamp);
            }
        }

        let key = (event.booking_id, event.to);
        if let Some(last) = state.last_raised.get(&key) {
            if event.timestamp - *last < self.dedupe_window {
                debug!(
                    booking_id = %event.booking_id,
                    status = %event.to,
                    "Duplicate alert suppressed"
                );
                return Vec::new();
            }
        }
        state.last_raised.insert(key, event.timestamp);

        let alert = Alert {
            id: Uuid::new_v4(),
            booking_id: event.booking_id,
            status: event.to,
            message: alert_message(event),
            priority: AlertPriority::for_status(event.to),
            created_at: event.timestamp,
            expires_at: (!event.to.is_terminal()).then(|| event.timestamp + self.ttl),
            acknowledged: false,
        };
        state.alerts.push(alert.clone());

        vec![alert]
    }

    /// Returns false for unknown ids
    pub fn acknowledge(&self, alert_id: Uuid) -> bool {
        let mut state = self.state.write();
        match state.alerts.iter_mut().find(|a| a.id == alert_id) {
            Some(alert) => {
                alert.acknowledged = true;
                true
            }
            None => false,
        }
    }

    /// Active alerts, highest priority first, then newest first
    pub fn active_alerts(&self, now: DateTime<Utc>) -> Vec<Alert> {
        let mut active: Vec<Alert> = self
            .state
            .read()
            .alerts
            .iter()
            .filter(|a| a.is_active(now))
            .cloned()
            .collect();
        active.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        active
    }

    pub fn alerts_for(&self, booking_id: Uuid, now: DateTime<Utc>) -> Vec<Alert> {
        self.active_alerts(now)
            .into_iter()
            .filter(|a| a.booking_id == booking_id)
            .collect()
    }

    /// Drop inactive alerts and stale dedupe entries; returns how many alerts went
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut state = self.state.write();
        let before = state.alerts.len();
        state.alerts.retain(|a| a.is_active(now));

        let horizon = now - self.dedupe_window;
        state.last_raised.retain(|_, raised_at| *raised_at > horizon);

        before - state.alerts.len()
    }

    /// Consume events until shutdown is signalled or the channel closes,
    /// purging inactive alerts on every `purge_interval`
    pub async fn run(
        self: Arc<Self>,
        mut receiver: broadcast::Receiver<BookingTransitioned>,
        mut shutdown: watch::Receiver<bool>,
        clock: Arc<dyn Clock>,
    ) {
        let mut purge = interval_at(Instant::now() + self.purge_interval, self.purge_interval);
        purge.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Alert aggregator started");
        loop {
            tokio::select! {
                received = receiver.recv() => match received {
                    Ok(event) => {
                        self.on_transition(&event);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Alert aggregator lagged behind transition events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = purge.tick() => {
                    let purged = self.purge_expired(clock.now());
                    if purged > 0 {
                        debug!(purged, "Purged inactive alerts");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Alert aggregator stopped");
    }

    pub fn spawn(
        self: &Arc<Self>,
        receiver: broadcast::Receiver<BookingTransitioned>,
        shutdown: watch::Receiver<bool>,
        clock: Arc<dyn Clock>,
    ) -> JoinHandle<()> {
        tokio::spawn(Arc::clone(self).run(receiver, shutdown, clock))
    }
}

fn alert_message(event: &BookingTransitioned) -> String {
    format!(
        "Booking {} is now {} (was {})",
        event.booking_id,
        event.to.label(),
        event.from.label()
    )
}
