use crate::common::{t0, BookingBuilder, RecordingNotifier};
use booking_lifecycle::alerts::AlertPriority;
use booking_lifecycle::config::{ConfigManager, LifecycleConfig};
use booking_lifecycle::orchestration::{LifecycleSystem, ManualClock, SchedulerState};
use booking_lifecycle::state_machine::{BookingStatus, StatusRegistry};
use booking_lifecycle::store::InMemoryBookingStore;
use booking_lifecycle::LifecycleError;
use chrono::Duration;
use std::sync::Arc;
use std::time::Duration as StdDuration;

fn manager(config: LifecycleConfig) -> Arc<ConfigManager> {
    Arc::new(ConfigManager::from_config(config, "test").unwrap())
}

#[tokio::test(start_paused = true)]
async fn test_transitions_reach_alerts_and_notifier() {
    let store = Arc::new(InMemoryBookingStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let clock = Arc::new(ManualClock::new(t0()));

    let no_show = BookingBuilder::starting_at(t0() - Duration::hours(2))
        .with_status(BookingStatus::RunningLate)
        .build();
    store.seed(no_show.clone());

    let system = LifecycleSystem::bootstrap(
        manager(LifecycleConfig::default()),
        store.clone(),
        notifier.clone(),
        clock.clone(),
    )
    .unwrap();
    system.start().unwrap();
    tokio::time::sleep(StdDuration::from_millis(10)).await;

    let alerts = system.alerts().alerts_for(no_show.id, t0());
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].status, BookingStatus::NoShow);
    assert_eq!(alerts[0].priority, AlertPriority::High);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].booking_id, no_show.id);

    let status = system.status();
    assert!(status.running);
    assert_eq!(status.environment, "test");
    assert_eq!(status.transitions_recorded, 1);
    assert_eq!(status.active_alerts, 1);
    assert_eq!(status.scheduler_stats.passes_completed, 1);

    system.shutdown().await;
    system.shutdown().await;
    assert!(!system.is_running());
    assert_eq!(system.status().scheduler_state, SchedulerState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_manual_changes_are_not_forwarded_to_notifier() {
    let store = Arc::new(InMemoryBookingStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let booking = BookingBuilder::starting_at(t0() + Duration::minutes(5))
        .with_status(BookingStatus::Upcoming)
        .build();
    store.seed(booking.clone());

    let system = LifecycleSystem::bootstrap(
        manager(LifecycleConfig::default()),
        store,
        notifier.clone(),
        Arc::new(ManualClock::new(t0())),
    )
    .unwrap();
    system.start().unwrap();

    system
        .service()
        .check_in(booking.id, 0, "reception")
        .await
        .unwrap();
    tokio::time::sleep(StdDuration::from_millis(10)).await;

    assert!(notifier.sent().is_empty());
    assert_eq!(system.alerts().alerts_for(booking.id, t0()).len(), 1);
    system.shutdown().await;
}

#[test]
fn test_malformed_transition_table_is_fatal() {
    let mut table = StatusRegistry::standard().to_table();
    table.insert("upcoming".to_string(), vec!["in_session".to_string()]);
    let mut config = LifecycleConfig::default();
    config.transitions = Some(table);

    let err = ConfigManager::from_config(config, "test").unwrap_err();
    assert!(LifecycleError::from(err).is_fatal());
}
