use super::types::BookingTransitioned;
use crate::constants::defaults;
use tokio::sync::broadcast;
use tracing::trace;

/// Fan-out publisher for booking transition events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<BookingTransitioned>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a transition event
    ///
    /// Synchronous so it can run in the same step as the audit record. Publishing
    /// with no subscribers is not an error.
    pub fn publish(&self, event: BookingTransitioned) {
        match self.sender.send(event) {
            Ok(receivers) => trace!(receivers, "Transition event published"),
            Err(broadcast::error::SendError(event)) => {
                trace!(booking_id = %event.booking_id, "Transition event published without subscribers")
            }
        }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<BookingTransitioned> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(defaults::EVENT_CHANNEL_CAPACITY)
    }
}
