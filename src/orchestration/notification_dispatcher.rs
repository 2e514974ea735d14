//! Forwards automatic status changes to the notifier.
//!
//! Runs as its own subscriber so a slow or failing notification channel never
//! holds up the scheduler. Manual transitions are not forwarded; the staff member
//! who made them already knows.

use crate::events::BookingTransitioned;
use crate::logging::log_error;
use crate::models::TriggeredBy;
use crate::notifier::{NotificationChannel, Notifier};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    channel: NotificationChannel,
    timeout: Duration,
    delivered: AtomicU64,
    failed: AtomicU64,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, channel: NotificationChannel, timeout: Duration) -> Self {
        Self {
            notifier,
            channel,
            timeout,
            delivered: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Notify about one event; failures are logged and counted, never returned
    pub async fn dispatch(&self, event: &BookingTransitioned) {
        if event.triggered_by != TriggeredBy::System {
            return;
        }

        let message = format!("Booking status updated to {}", event.to.label());
        let delivery = self.notifier.notify(event.booking_id, &message, self.channel);

        match tokio::time::timeout(self.timeout, delivery).await {
            Ok(Ok(())) => {
                self.delivered.fetch_add(1, Ordering::Relaxed);
                debug!(booking_id = %event.booking_id, to = %event.to, "Status notification sent");
            }
            Ok(Err(e)) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                log_error(
                    "notification_dispatcher",
                    "notify",
                    &e.to_string(),
                    Some(&event.booking_id.to_string()),
                );
            }
            Err(_) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                warn!(
                    booking_id = %event.booking_id,
                    channel = %self.channel,
                    "Status notification timed out"
                );
            }
        }
    }

    /// Consume events until shutdown is signalled or the channel closes
    pub async fn run(
        self: Arc<Self>,
        mut receiver: broadcast::Receiver<BookingTransitioned>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(channel = %self.channel, "Notification dispatcher started");
        loop {
            tokio::select! {
                received = receiver.recv() => match received {
                    Ok(event) => self.dispatch(&event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Notification dispatcher lagged behind transition events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Notification dispatcher stopped");
    }

    pub fn spawn(
        self: &Arc<Self>,
        receiver: broadcast::Receiver<BookingTransitioned>,
        shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(Arc::clone(self).run(receiver, shutdown))
    }
}
