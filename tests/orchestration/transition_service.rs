use crate::common::{t0, BookingBuilder, RecordingNotifier, TestHarness};
use booking_lifecycle::models::TriggeredBy;
use booking_lifecycle::notifier::{NotificationChannel, NotifierError};
use booking_lifecycle::orchestration::{
    ManualTransitionRequest, RescheduleRequest, TransitionServiceError,
};
use booking_lifecycle::state_machine::{BookingStatus, RejectionReason, TransitionValidator};
use chrono::{Duration, NaiveTime};
use std::time::Duration as StdDuration;
use uuid::Uuid;

fn request(booking_id: Uuid, expected_version: u64, target: BookingStatus) -> ManualTransitionRequest {
    ManualTransitionRequest {
        booking_id,
        expected_version,
        target,
        actor: "therapist-1".to_string(),
        reason: None,
    }
}

#[tokio::test]
async fn test_complete_then_stale_repeat_conflicts() {
    let harness = TestHarness::new();
    let booking = harness.seed(
        BookingBuilder::starting_at(t0() - Duration::minutes(30))
            .with_status(BookingStatus::InSession)
            .with_version(7),
    );

    let applied = harness
        .service
        .request_transition(request(booking.id, 7, BookingStatus::Completed))
        .await
        .unwrap();
    assert_eq!(applied.booking.status, BookingStatus::Completed);
    assert_eq!(applied.booking.version, 8);
    assert_eq!(applied.transition.triggered_by, TriggeredBy::User);
    assert_eq!(applied.transition.actor.as_deref(), Some("therapist-1"));

    let err = harness
        .service
        .request_transition(request(booking.id, 7, BookingStatus::Completed))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TransitionServiceError::VersionConflict {
            expected_version: 7,
            current_version: 8,
            ..
        }
    ));
    assert!(err.user_message().contains("refresh"));
    assert_eq!(harness.log.history(booking.id).len(), 1);
}

#[tokio::test]
async fn test_completed_booking_cannot_restart() {
    let harness = TestHarness::new();
    let booking = harness.seed(
        BookingBuilder::starting_at(t0() - Duration::hours(2))
            .with_status(BookingStatus::Completed)
            .with_version(5),
    );

    let err = harness
        .service
        .request_transition(request(booking.id, 5, BookingStatus::InSession))
        .await
        .unwrap_err();

    match &err {
        TransitionServiceError::Rejected(rejection) => {
            assert_eq!(rejection.from, BookingStatus::Completed);
            assert_eq!(rejection.to, BookingStatus::InSession);
            assert_eq!(rejection.reason, RejectionReason::FromIsTerminal);
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert!(err.user_message().contains("no longer be changed"));
    assert_eq!(harness.get(booking.id).await.version, 5);
    assert!(harness.log.is_empty());
}

#[tokio::test]
async fn test_skipped_edge_rejected_without_write() {
    let harness = TestHarness::new();
    let mut events = harness.publisher.subscribe();
    let booking = harness.seed(BookingBuilder::starting_at(t0() + Duration::hours(3)));

    let err = harness
        .service
        .request_transition(request(booking.id, 0, BookingStatus::InSession))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TransitionServiceError::Rejected(ref e) if e.reason == RejectionReason::NotInSuccessorSet
    ));
    assert_eq!(harness.store.cas_attempts(), 0);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_unknown_booking_not_found() {
    let harness = TestHarness::new();
    let err = harness
        .service
        .request_transition(request(Uuid::new_v4(), 0, BookingStatus::Cancelled))
        .await
        .unwrap_err();
    assert!(matches!(err, TransitionServiceError::NotFound(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_requests_have_one_winner() {
    let harness = TestHarness::new();
    let booking = harness.seed(
        BookingBuilder::starting_at(t0() + Duration::minutes(5)).with_status(BookingStatus::Upcoming),
    );

    let attempts = [
        BookingStatus::ClientArrived,
        BookingStatus::Cancelled,
        BookingStatus::InSession,
        BookingStatus::ClientArrived,
    ]
    .into_iter()
    .map(|target| {
        let service = harness.service.clone();
        let id = booking.id;
        tokio::spawn(async move { service.request_transition(request(id, 0, target)).await })
    });
    let results = futures::future::join_all(attempts).await;

    let winners = results
        .iter()
        .filter(|r| matches!(r, Ok(Ok(_))))
        .count();
    assert_eq!(winners, 1);
    assert!(results.iter().all(|r| match r {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => matches!(e, TransitionServiceError::VersionConflict { .. }),
        Err(_) => false,
    }));
    assert_eq!(harness.get(booking.id).await.version, 1);
    assert_eq!(harness.log.history(booking.id).len(), 1);
}

#[tokio::test]
async fn test_timestamps_stay_increasing_when_clock_steps_back() {
    let harness = TestHarness::new();
    let booking = harness.seed(
        BookingBuilder::starting_at(t0() + Duration::minutes(5)).with_status(BookingStatus::Upcoming),
    );

    let arrived = harness
        .service
        .check_in(booking.id, 0, "reception")
        .await
        .unwrap();
    harness.clock.set(t0() - Duration::minutes(10));
    let started = harness
        .service
        .start_session(booking.id, 1, "therapist-1")
        .await
        .unwrap();

    assert_eq!(arrived.transition.timestamp, t0());
    assert!(started.transition.timestamp > arrived.transition.timestamp);
    assert_eq!(arrived.transition.reason, "client arrived");
}

#[tokio::test]
async fn test_quick_actions_follow_a_full_session() {
    let harness = TestHarness::new();
    let booking = harness.seed(BookingBuilder::starting_at(t0() + Duration::hours(30)));
    let service = &harness.service;

    service.confirm(booking.id, 0, "reception").await.unwrap();
    service.send_reminder(booking.id, 1, "reception").await.unwrap();
    service
        .request_transition(request(booking.id, 2, BookingStatus::Upcoming))
        .await
        .unwrap();
    service.check_in(booking.id, 3, "reception").await.unwrap();
    service.start_session(booking.id, 4, "therapist-1").await.unwrap();
    let done = service.complete(booking.id, 5, "therapist-1").await.unwrap();

    assert_eq!(done.booking.status, BookingStatus::Completed);
    assert_eq!(
        harness
            .log
            .replay_path(booking.id, &TransitionValidator::default())
            .unwrap(),
        BookingStatus::Completed
    );
    assert_eq!(harness.log.history(booking.id).len(), 6);
}

#[tokio::test]
async fn test_reminder_sent_after_delivery() {
    let harness = TestHarness::new();
    let booking = harness.seed(BookingBuilder::starting_at(t0() + Duration::hours(30)));

    let applied = harness
        .service
        .send_reminder(booking.id, 0, "reception")
        .await
        .unwrap();

    assert_eq!(applied.booking.status, BookingStatus::ReminderSent);
    let sent = harness.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].booking_id, booking.id);
    assert_eq!(sent[0].channel, NotificationChannel::Sms);
    assert!(sent[0].message.contains("psychology"));
}

#[tokio::test]
async fn test_failed_reminder_leaves_booking_unchanged() {
    let harness = TestHarness::with_notifier(RecordingNotifier::failing());
    let mut events = harness.publisher.subscribe();
    let booking = harness.seed(BookingBuilder::starting_at(t0() + Duration::hours(30)));

    let err = harness
        .service
        .send_reminder(booking.id, 0, "reception")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TransitionServiceError::Notifier(NotifierError::DeliveryFailed { .. })
    ));
    let stored = harness.get(booking.id).await;
    assert_eq!(stored.status, BookingStatus::Scheduled);
    assert_eq!(stored.version, 0);
    assert!(harness.log.is_empty());
    assert!(events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_stalled_reminder_times_out() {
    let notifier = RecordingNotifier::new();
    notifier.set_delay(Some(StdDuration::from_secs(60)));
    let harness = TestHarness::with_notifier(notifier);
    let booking = harness.seed(BookingBuilder::starting_at(t0() + Duration::hours(30)));

    let err = harness
        .service
        .send_reminder(booking.id, 0, "reception")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TransitionServiceError::Notifier(NotifierError::Timeout {
            timeout_ms: 10_000,
            ..
        })
    ));
    assert_eq!(harness.get(booking.id).await.status, BookingStatus::Scheduled);
}

#[tokio::test]
async fn test_reminder_not_sent_for_illegal_edge() {
    let harness = TestHarness::new();
    let booking = harness.seed(
        BookingBuilder::starting_at(t0() + Duration::minutes(30)).with_status(BookingStatus::Upcoming),
    );

    let err = harness
        .service
        .send_reminder(booking.id, 0, "reception")
        .await
        .unwrap_err();

    assert!(matches!(err, TransitionServiceError::Rejected(_)));
    assert!(harness.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_reschedule_freezes_old_booking_and_creates_replacement() {
    let harness = TestHarness::new();
    let booking = harness.seed(BookingBuilder::starting_at(t0() + Duration::hours(30)));
    let new_date = (t0() + Duration::days(7)).date_naive();

    let outcome = harness
        .service
        .reschedule(RescheduleRequest {
            booking_id: booking.id,
            expected_version: 0,
            date: new_date,
            start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            actor: "reception".to_string(),
            reason: None,
        })
        .await
        .unwrap();

    assert_eq!(outcome.previous.status, BookingStatus::Rescheduled);
    assert_eq!(outcome.replacement.status, BookingStatus::Scheduled);
    assert_eq!(outcome.replacement.rescheduled_from, Some(booking.id));
    assert_eq!(outcome.replacement.client_id, booking.client_id);
    assert_eq!(outcome.replacement.date, new_date);
    assert_eq!(outcome.transition.to, BookingStatus::Rescheduled);
    assert_eq!(outcome.replacement.created_at, t0());

    // The old booking is frozen and no longer scanned
    let active = harness.scheduler.run_pass().await.unwrap();
    assert_eq!(active.examined, 1);
    let err = harness
        .service
        .request_transition(request(booking.id, 1, BookingStatus::Cancelled))
        .await
        .unwrap_err();
    assert!(matches!(err, TransitionServiceError::Rejected(_)));
}

#[tokio::test]
async fn test_reschedule_keeps_old_booking_frozen_when_insert_fails() {
    let harness = TestHarness::new();
    let booking = harness.seed(BookingBuilder::starting_at(t0() + Duration::hours(30)));
    harness.store.set_reject_inserts(true);

    let err = harness
        .service
        .reschedule(RescheduleRequest {
            booking_id: booking.id,
            expected_version: 0,
            date: (t0() + Duration::days(7)).date_naive(),
            start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            actor: "reception".to_string(),
            reason: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, TransitionServiceError::Store(_)));
    assert_eq!(harness.get(booking.id).await.status, BookingStatus::Rescheduled);
    assert_eq!(harness.store.snapshot().len(), 1);
    assert_eq!(
        harness.log.latest(booking.id).unwrap().to,
        BookingStatus::Rescheduled
    );
}

#[tokio::test]
async fn test_reschedule_with_inverted_times_writes_nothing() {
    let harness = TestHarness::new();
    let booking = harness.seed(BookingBuilder::starting_at(t0() + Duration::hours(30)));

    let err = harness
        .service
        .reschedule(RescheduleRequest {
            booking_id: booking.id,
            expected_version: 0,
            date: t0().date_naive(),
            start_time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            actor: "reception".to_string(),
            reason: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, TransitionServiceError::Store(_)));
    assert_eq!(harness.get(booking.id).await.status, BookingStatus::Scheduled);
    assert_eq!(harness.store.snapshot().len(), 1);
}

#[tokio::test]
async fn test_cancel_records_reason() {
    let harness = TestHarness::new();
    let booking = harness.seed(BookingBuilder::starting_at(t0() + Duration::hours(30)));

    let applied = harness
        .service
        .cancel(booking.id, 0, "reception", Some("client unwell".to_string()))
        .await
        .unwrap();

    assert_eq!(applied.transition.reason, "client unwell");
    assert_eq!(harness.log.latest(booking.id).unwrap().to, BookingStatus::Cancelled);
}
