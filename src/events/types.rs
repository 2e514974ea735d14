//! Event payloads fanned out after a transition has been stored.

use crate::constants::events::BOOKING_TRANSITIONED;
use crate::models::{Transition, TriggeredBy};
use crate::state_machine::BookingStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Published once per applied transition, never for rejected or conflicting attempts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingTransitioned {
    pub booking_id: Uuid,
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub timestamp: DateTime<Utc>,
    pub triggered_by: TriggeredBy,
    pub actor: Option<String>,
    pub reason: String,
    pub version: u64,
}

impl BookingTransitioned {
    pub fn name(&self) -> &'static str {
        BOOKING_TRANSITIONED
    }
}

impl From<&Transition> for BookingTransitioned {
    fn from(transition: &Transition) -> Self {
        Self {
            booking_id: transition.booking_id,
            from: transition.from,
            to: transition.to,
            timestamp: transition.timestamp,
            triggered_by: transition.triggered_by,
            actor: transition.actor.clone(),
            reason: transition.reason.clone(),
            version: transition.version,
        }
    }
}
