use super::errors::{RejectionReason, TransitionError, TransitionResult};
use super::registry::StatusRegistry;
use super::states::BookingStatus;
use std::sync::Arc;

/// Guard conditions for booking status transitions
///
/// Pure lookup against a shared [`StatusRegistry`]; cheap to clone and safe to
/// use from any number of tasks without locking.
#[derive(Debug, Clone)]
pub struct TransitionValidator {
    registry: Arc<StatusRegistry>,
}

impl TransitionValidator {
    pub fn new(registry: Arc<StatusRegistry>) -> Self {
        Self { registry }
    }

    /// Check if a transition is valid
    pub fn validate(&self, from: BookingStatus, to: BookingStatus) -> TransitionResult<()> {
        // Terminal states cannot transition
        if self.registry.is_terminal(from) {
            return Err(TransitionError::new(
                from,
                to,
                RejectionReason::FromIsTerminal,
            ));
        }

        if !self.registry.allows(from, to) {
            return Err(TransitionError::new(
                from,
                to,
                RejectionReason::NotInSuccessorSet,
            ));
        }

        Ok(())
    }

    pub fn registry(&self) -> &StatusRegistry {
        &self.registry
    }
}

impl Default for TransitionValidator {
    fn default() -> Self {
        Self::new(Arc::new(StatusRegistry::standard()))
    }
}
