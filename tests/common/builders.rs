//! Booking builders and a fully wired test harness

use super::mocks::RecordingNotifier;
use super::t0;
use booking_lifecycle::audit::TransitionLog;
use booking_lifecycle::config::LifecycleConfig;
use booking_lifecycle::events::EventPublisher;
use booking_lifecycle::models::{Booking, NewBooking};
use booking_lifecycle::orchestration::{
    BookingStatusScheduler, Clock, ManualClock, TransitionService,
};
use booking_lifecycle::state_machine::{AutoTransitionPolicy, BookingStatus, TransitionValidator};
use booking_lifecycle::store::{BookingStore, InMemoryBookingStore};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Builder for bookings in any status, with times given in UTC
pub struct BookingBuilder {
    start: DateTime<Utc>,
    minutes: i64,
    status: BookingStatus,
    version: u64,
    last_transition_at: Option<DateTime<Utc>>,
    client_id: String,
    therapy_type: String,
}

impl BookingBuilder {
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            start,
            minutes: 60,
            status: BookingStatus::Scheduled,
            version: 0,
            last_transition_at: None,
            client_id: "client-1".to_string(),
            therapy_type: "psychology".to_string(),
        }
    }

    pub fn lasting(mut self, minutes: i64) -> Self {
        self.minutes = minutes;
        self
    }

    pub fn ending_at(mut self, end: DateTime<Utc>) -> Self {
        self.minutes = (end - self.start).num_minutes();
        self
    }

    pub fn with_status(mut self, status: BookingStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub fn with_last_transition_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_transition_at = Some(at);
        self
    }

    pub fn with_client(mut self, client_id: &str) -> Self {
        self.client_id = client_id.to_string();
        self
    }

    pub fn build(self) -> Booking {
        let end = self.start + Duration::minutes(self.minutes);
        let mut booking = NewBooking::new(
            self.client_id,
            self.therapy_type,
            self.start.date_naive(),
            self.start.time(),
            end.time(),
        )
        .into_booking(Uuid::new_v4(), t0() - Duration::days(7));
        booking.status = self.status;
        booking.version = self.version;
        booking.last_transition_at = self.last_transition_at;
        booking
    }
}

/// Every component wired against a manual clock, in-memory store and recording notifier
pub struct TestHarness {
    pub config: LifecycleConfig,
    pub clock: Arc<ManualClock>,
    pub store: Arc<InMemoryBookingStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub log: Arc<TransitionLog>,
    pub publisher: EventPublisher,
    pub service: Arc<TransitionService>,
    pub scheduler: Arc<BookingStatusScheduler>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::build(LifecycleConfig::default(), RecordingNotifier::new())
    }

    pub fn with_config(config: LifecycleConfig) -> Self {
        Self::build(config, RecordingNotifier::new())
    }

    pub fn with_notifier(notifier: RecordingNotifier) -> Self {
        Self::build(LifecycleConfig::default(), notifier)
    }

    pub fn build(config: LifecycleConfig, notifier: RecordingNotifier) -> Self {
        let clock = Arc::new(ManualClock::new(t0()));
        let store = Arc::new(InMemoryBookingStore::with_clock(clock.clone()));
        let notifier = Arc::new(notifier);
        let log = Arc::new(TransitionLog::new());
        let publisher = EventPublisher::new(config.events.channel_capacity);
        let registry = Arc::new(config.registry().expect("valid registry"));

        let service = Arc::new(TransitionService::new(
            store.clone(),
            TransitionValidator::new(registry),
            log.clone(),
            publisher.clone(),
            notifier.clone(),
            clock.clone(),
            config.notifications.clone(),
        ));

        let policy = AutoTransitionPolicy::from_config(&config.policy).expect("valid policy");
        let scheduler = Arc::new(BookingStatusScheduler::new(
            store.clone(),
            service.clone(),
            policy,
            config.scheduler.clone(),
        ));

        Self {
            config,
            clock,
            store,
            notifier,
            log,
            publisher,
            service,
            scheduler,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn seed(&self, builder: BookingBuilder) -> Booking {
        let booking = builder.build();
        self.store.seed(booking.clone());
        booking
    }

    pub async fn get(&self, id: Uuid) -> Booking {
        self.store
            .get(id)
            .await
            .expect("store available")
            .expect("booking exists")
    }
}
