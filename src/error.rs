//! Error types for the booking lifecycle engine.
//!

use crate::config::ConfigurationError;
use crate::notifier::NotifierError;
use crate::orchestration::scheduler::SchedulerError;
use crate::orchestration::transition_service::TransitionServiceError;
use crate::state_machine::TransitionError;
use crate::store::StoreError;
use thiserror::Error;

/// Top-level error, one variant per layer
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Service(#[from] TransitionServiceError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Notifier(#[from] NotifierError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl LifecycleError {
    /// Startup-fatal errors; everything else is reported and survived
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, LifecycleError>;
