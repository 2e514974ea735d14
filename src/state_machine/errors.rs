use super::states::BookingStatus;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a transition was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// Target is not a legal successor of the current status
    NotInSuccessorSet,
    /// Current status is terminal
    FromIsTerminal,
    /// A recorded transition does not start where the previous one ended
    HistoryGap,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInSuccessorSet => write!(f, "not_in_successor_set"),
            Self::FromIsTerminal => write!(f, "from_is_terminal"),
            Self::HistoryGap => write!(f, "history_gap"),
        }
    }
}

/// Rejected status transition
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("Invalid booking transition from {from} to {to}: {reason}")]
pub struct TransitionError {
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub reason: RejectionReason,
}

impl TransitionError {
    pub fn new(from: BookingStatus, to: BookingStatus, reason: RejectionReason) -> Self {
        Self { from, to, reason }
    }

    pub fn is_terminal_rejection(&self) -> bool {
        self.reason == RejectionReason::FromIsTerminal
    }
}

/// Result type alias for validation
pub type TransitionResult<T> = Result<T, TransitionError>;
