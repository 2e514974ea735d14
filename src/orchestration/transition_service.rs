//! # Transition Service
//!
//! The one write path for booking status. Automatic rule firings from the scheduler
//! and manual requests from staff both end up in [`TransitionService::apply`], which
//! validates the edge, performs a compare-and-swap keyed on the booking version, and
//! then, in the same synchronous step, appends the audit record and publishes the
//! event. Nothing is recorded or published for an attempt whose CAS did not apply.
//!
//! Manual operations mirror the practice dashboard's quick actions: reminders,
//! confirmation, check-in, session start and completion, cancellation and
//! rescheduling.

use crate::audit::TransitionLog;
use crate::config::NotificationConfig;
use crate::events::{BookingTransitioned, EventPublisher};
use crate::logging::{log_error, log_transition};
use crate::models::{Booking, NewBooking, Transition, TriggeredBy};
use crate::notifier::{Notifier, NotifierError};
use crate::orchestration::clock::Clock;
use crate::state_machine::{AutoTransition, BookingStatus, TransitionError, TransitionValidator};
use crate::store::{BookingStore, CasOutcome, StoreError};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TransitionServiceError {
    #[error(transparent)]
    Rejected(#[from] TransitionError),

    #[error("Booking {booking_id} version conflict: expected {expected_version}, current {current_version}")]
    VersionConflict {
        booking_id: Uuid,
        expected_version: u64,
        current_version: u64,
    },

    #[error("Booking {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Notifier(#[from] NotifierError),
}

impl TransitionServiceError {
    /// Text suitable for showing to the staff member who made the request
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected(error) if error.is_terminal_rejection() => format!(
                "This booking is already {} and can no longer be changed.",
                error.from.label().to_lowercase()
            ),
            Self::Rejected(error) => format!(
                "A booking that is {} cannot be moved to {}.",
                error.from.label().to_lowercase(),
                error.to.label().to_lowercase()
            ),
            Self::VersionConflict { .. } => {
                "This booking was already updated, please refresh and try again.".to_string()
            }
            Self::NotFound(_) => "This booking no longer exists.".to_string(),
            Self::Store(_) => {
                "Bookings are temporarily unavailable, please try again shortly.".to_string()
            }
            Self::Notifier(_) => {
                "The notification could not be sent; the booking was not changed.".to_string()
            }
        }
    }
}

pub type ServiceResult<T> = Result<T, TransitionServiceError>;

/// Manual status change requested by a staff member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualTransitionRequest {
    pub booking_id: Uuid,
    /// Version the requester last saw
    pub expected_version: u64,
    pub target: BookingStatus,
    pub actor: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescheduleRequest {
    pub booking_id: Uuid,
    pub expected_version: u64,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub actor: String,
    pub reason: Option<String>,
}

/// A transition that was stored, with the booking as it now reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedTransition {
    pub booking: Booking,
    pub transition: Transition,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescheduleOutcome {
    /// Original booking, now frozen in `rescheduled`
    pub previous: Booking,
    /// New `scheduled` booking pointing back at `previous`
    pub replacement: Booking,
    pub transition: Transition,
}

/// Result of one attempted write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied(AppliedTransition),
    VersionConflict { current_version: u64 },
    NotFound,
}

#[derive(Debug)]
pub struct TransitionService {
    store: Arc<dyn BookingStore>,
    validator: TransitionValidator,
    log: Arc<TransitionLog>,
    publisher: EventPublisher,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    notifications: NotificationConfig,
}

impl TransitionService {
    pub fn new(
        store: Arc<dyn BookingStore>,
        validator: TransitionValidator,
        log: Arc<TransitionLog>,
        publisher: EventPublisher,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        notifications: NotificationConfig,
    ) -> Self {
        Self {
            store,
            validator,
            log,
            publisher,
            notifier,
            clock,
            notifications,
        }
    }

    pub fn validator(&self) -> &TransitionValidator {
        &self.validator
    }

    pub fn log(&self) -> &Arc<TransitionLog> {
        &self.log
    }

    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Validate and CAS one status change against the `booking` snapshot
    pub async fn apply(
        &self,
        booking: &Booking,
        to: BookingStatus,
        reason: &str,
        triggered_by: TriggeredBy,
        actor: Option<&str>,
    ) -> ServiceResult<ApplyOutcome> {
        self.validator.validate(booking.status, to)?;

        let at = self.transition_timestamp(booking);
        let outcome = self
            .store
            .compare_and_swap_status(booking.id, booking.version, to, at)
            .await?;

        let updated = match outcome {
            CasOutcome::Applied(updated) => updated,
            CasOutcome::VersionConflict { current_version } => {
                debug!(
                    booking_id = %booking.id,
                    expected_version = booking.version,
                    current_version,
                    "Transition lost version race"
                );
                return Ok(ApplyOutcome::VersionConflict { current_version });
            }
            CasOutcome::NotFound => return Ok(ApplyOutcome::NotFound),
        };

        // No await from here on: the record and the event go out together
        let transition = Transition {
            booking_id: booking.id,
            from: booking.status,
            to,
            reason: reason.to_string(),
            triggered_by,
            actor: actor.map(str::to_string),
            version: updated.version,
            timestamp: at,
        };
        self.log.record(transition.clone());
        self.publisher.publish(BookingTransitioned::from(&transition));
        log_transition(&transition);

        Ok(ApplyOutcome::Applied(AppliedTransition {
            booking: updated,
            transition,
        }))
    }

    /// Apply a fired automatic rule on behalf of the scheduler
    pub async fn apply_automatic(
        &self,
        booking: &Booking,
        auto: AutoTransition,
    ) -> ServiceResult<ApplyOutcome> {
        self.apply(booking, auto.to, auto.rule.reason(), TriggeredBy::System, None)
            .await
    }

    /// Staff-initiated status change
    ///
    /// A stale `expected_version` is reported before the edge is validated, so the
    /// caller learns to refresh rather than getting a misleading rejection.
    pub async fn request_transition(
        &self,
        request: ManualTransitionRequest,
    ) -> ServiceResult<AppliedTransition> {
        let booking = self
            .load_expected(request.booking_id, request.expected_version)
            .await?;
        let reason = request
            .reason
            .unwrap_or_else(|| format!("manual update to {}", request.target));

        self.apply_manual(&booking, request.target, &reason, &request.actor)
            .await
    }

    /// Notify the client, then mark the booking `reminder_sent`
    ///
    /// A failed or timed-out notification leaves the booking unchanged.
    pub async fn send_reminder(
        &self,
        booking_id: Uuid,
        expected_version: u64,
        actor: &str,
    ) -> ServiceResult<AppliedTransition> {
        let booking = self.load_expected(booking_id, expected_version).await?;
        self.validator
            .validate(booking.status, BookingStatus::ReminderSent)?;

        let channel = self.notifications.reminder_channel;
        let message = format!(
            "Reminder: your {} session is on {} at {}",
            booking.therapy_type,
            booking.date,
            booking.start_time.format("%H:%M")
        );

        let timeout = self.notifications.timeout();
        match tokio::time::timeout(timeout, self.notifier.notify(booking.id, &message, channel))
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                warn!(booking_id = %booking.id, error = %error, "Reminder delivery failed");
                return Err(error.into());
            }
            Err(_) => {
                warn!(booking_id = %booking.id, channel = %channel, "Reminder delivery timed out");
                return Err(NotifierError::Timeout {
                    channel,
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                }
                .into());
            }
        }

        self.apply_manual(
            &booking,
            BookingStatus::ReminderSent,
            &format!("reminder sent via {channel}"),
            actor,
        )
        .await
    }

    pub async fn confirm(
        &self,
        booking_id: Uuid,
        expected_version: u64,
        actor: &str,
    ) -> ServiceResult<AppliedTransition> {
        self.quick_action(
            booking_id,
            expected_version,
            actor,
            BookingStatus::ConfirmedClient,
            "client confirmed attendance",
        )
        .await
    }

    pub async fn check_in(
        &self,
        booking_id: Uuid,
        expected_version: u64,
        actor: &str,
    ) -> ServiceResult<AppliedTransition> {
        self.quick_action(
            booking_id,
            expected_version,
            actor,
            BookingStatus::ClientArrived,
            "client arrived",
        )
        .await
    }

    pub async fn start_session(
        &self,
        booking_id: Uuid,
        expected_version: u64,
        actor: &str,
    ) -> ServiceResult<AppliedTransition> {
        self.quick_action(
            booking_id,
            expected_version,
            actor,
            BookingStatus::InSession,
            "session started",
        )
        .await
    }

    pub async fn complete(
        &self,
        booking_id: Uuid,
        expected_version: u64,
        actor: &str,
    ) -> ServiceResult<AppliedTransition> {
        self.quick_action(
            booking_id,
            expected_version,
            actor,
            BookingStatus::Completed,
            "session completed",
        )
        .await
    }

    pub async fn cancel(
        &self,
        booking_id: Uuid,
        expected_version: u64,
        actor: &str,
        reason: Option<String>,
    ) -> ServiceResult<AppliedTransition> {
        let booking = self.load_expected(booking_id, expected_version).await?;
        let reason = reason.unwrap_or_else(|| "booking cancelled".to_string());
        self.apply_manual(&booking, BookingStatus::Cancelled, &reason, actor)
            .await
    }

    /// Freeze the booking as `rescheduled` and create its replacement
    ///
    /// The new times are validated before anything is written. The old booking is
    /// swapped first; the replacement is only inserted once that swap applied. If the
    /// insert then fails the old booking stays `rescheduled` without a replacement,
    /// which is logged with its id so it can be recreated.
    pub async fn reschedule(&self, request: RescheduleRequest) -> ServiceResult<RescheduleOutcome> {
        let booking = self
            .load_expected(request.booking_id, request.expected_version)
            .await?;

        let replacement = NewBooking::new(
            booking.client_id.clone(),
            booking.therapy_type.clone(),
            request.date,
            request.start_time,
            request.end_time,
        )
        .rescheduled_from(booking.id);
        replacement
            .validate()
            .map_err(|reason| StoreError::InvalidBooking { reason })?;

        let reason = request.reason.unwrap_or_else(|| {
            format!(
                "rescheduled to {} {}-{}",
                request.date,
                request.start_time.format("%H:%M"),
                request.end_time.format("%H:%M")
            )
        });
        let applied = self
            .apply_manual(&booking, BookingStatus::Rescheduled, &reason, &request.actor)
            .await?;

        let replacement = match self.store.insert(replacement).await {
            Ok(replacement) => replacement,
            Err(e) => {
                log_error(
                    "transition_service",
                    "reschedule_insert_replacement",
                    &e.to_string(),
                    Some(&format!(
                        "booking {} is rescheduled but has no replacement (requested {} {}-{})",
                        applied.booking.id,
                        request.date,
                        request.start_time.format("%H:%M"),
                        request.end_time.format("%H:%M")
                    )),
                );
                return Err(e.into());
            }
        };
        debug!(
            previous = %applied.booking.id,
            replacement = %replacement.id,
            "Replacement booking created"
        );

        Ok(RescheduleOutcome {
            previous: applied.booking,
            replacement,
            transition: applied.transition,
        })
    }

    async fn quick_action(
        &self,
        booking_id: Uuid,
        expected_version: u64,
        actor: &str,
        target: BookingStatus,
        reason: &str,
    ) -> ServiceResult<AppliedTransition> {
        let booking = self.load_expected(booking_id, expected_version).await?;
        self.apply_manual(&booking, target, reason, actor).await
    }

    async fn apply_manual(
        &self,
        booking: &Booking,
        target: BookingStatus,
        reason: &str,
        actor: &str,
    ) -> ServiceResult<AppliedTransition> {
        match self
            .apply(booking, target, reason, TriggeredBy::User, Some(actor))
            .await?
        {
            ApplyOutcome::Applied(applied) => Ok(applied),
            ApplyOutcome::VersionConflict { current_version } => {
                Err(TransitionServiceError::VersionConflict {
                    booking_id: booking.id,
                    expected_version: booking.version,
                    current_version,
                })
            }
            ApplyOutcome::NotFound => Err(TransitionServiceError::NotFound(booking.id)),
        }
    }

    async fn load_expected(&self, booking_id: Uuid, expected_version: u64) -> ServiceResult<Booking> {
        let booking = self
            .store
            .get(booking_id)
            .await?
            .ok_or(TransitionServiceError::NotFound(booking_id))?;

        if booking.version != expected_version {
            return Err(TransitionServiceError::VersionConflict {
                booking_id,
                expected_version,
                current_version: booking.version,
            });
        }

        Ok(booking)
    }

    /// Strictly after the booking's previous transition, even if the clock is behind
    fn transition_timestamp(&self, booking: &Booking) -> DateTime<Utc> {
        let now = self.clock.now();
        match booking.last_transition_at {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        }
    }
}
