//! Notifier doubles

use async_trait::async_trait;
use booking_lifecycle::notifier::{NotificationChannel, Notifier, NotifierError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub booking_id: Uuid,
    pub message: String,
    pub channel: NotificationChannel,
}

/// Records every notification; can be switched to fail or to stall
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentNotification>>,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.set_failing(true);
        notifier
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock() = delay;
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        booking_id: Uuid,
        message: &str,
        channel: NotificationChannel,
    ) -> Result<(), NotifierError> {
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifierError::delivery_failed(channel, "gateway rejected message"));
        }

        self.sent.lock().push(SentNotification {
            booking_id,
            message: message.to_string(),
            channel,
        });
        Ok(())
    }
}
