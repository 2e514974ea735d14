//! # Notifier
//!
//! Outbound notification boundary. Delivery is best effort: a failed notification
//! never rolls back a status change that has already been stored.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    InApp,
    Email,
    Sms,
}

impl NotificationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InApp => "in_app",
            Self::Email => "email",
            Self::Sms => "sms",
        }
    }
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_app" => Ok(Self::InApp),
            "email" => Ok(Self::Email),
            "sms" => Ok(Self::Sms),
            _ => Err(format!("Invalid notification channel: {s}")),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum NotifierError {
    #[error("Notification delivery failed on {channel}: {reason}")]
    DeliveryFailed {
        channel: NotificationChannel,
        reason: String,
    },

    #[error("Notification on {channel} timed out after {timeout_ms}ms")]
    Timeout {
        channel: NotificationChannel,
        timeout_ms: u64,
    },
}

impl NotifierError {
    pub fn delivery_failed(channel: NotificationChannel, reason: impl Into<String>) -> Self {
        Self::DeliveryFailed {
            channel,
            reason: reason.into(),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync + fmt::Debug {
    async fn notify(
        &self,
        booking_id: Uuid,
        message: &str,
        channel: NotificationChannel,
    ) -> Result<(), NotifierError>;
}

/// Notifier that only writes a structured log line
#[derive(Debug, Default, Clone)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(
        &self,
        booking_id: Uuid,
        message: &str,
        channel: NotificationChannel,
    ) -> Result<(), NotifierError> {
        info!(
            booking_id = %booking_id,
            channel = %channel,
            message = %message,
            "Notification delivered"
        );
        Ok(())
    }
}
