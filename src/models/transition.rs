use crate::state_machine::BookingStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Who caused a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggeredBy {
    System,
    User,
}

impl fmt::Display for TriggeredBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
        }
    }
}

/// An applied status change; immutable once recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub booking_id: Uuid,
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub reason: String,
    pub triggered_by: TriggeredBy,
    /// Acting user for manual transitions
    pub actor: Option<String>,
    /// Booking version produced by this transition
    pub version: u64,
    pub timestamp: DateTime<Utc>,
}

impl Transition {
    pub fn is_automatic(&self) -> bool {
        self.triggered_by == TriggeredBy::System
    }
}
