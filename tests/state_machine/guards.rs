use booking_lifecycle::state_machine::{
    BookingStatus, RejectionReason, StatusRegistry, TransitionValidator,
};

#[test]
fn test_validator_agrees_with_successor_table() {
    let validator = TransitionValidator::default();
    let registry = StatusRegistry::standard();

    for from in BookingStatus::ALL {
        for to in BookingStatus::ALL {
            let allowed = registry.successors_of(from).contains(&to);
            assert_eq!(
                validator.validate(from, to).is_ok(),
                allowed,
                "{from} -> {to}"
            );
        }
    }
}

#[test]
fn test_no_resurrection_from_terminal_statuses() {
    let validator = TransitionValidator::default();

    for from in BookingStatus::ALL.into_iter().filter(BookingStatus::is_terminal) {
        for to in BookingStatus::ALL {
            let err = validator.validate(from, to).unwrap_err();
            assert_eq!(err.reason, RejectionReason::FromIsTerminal);
        }
    }
}

#[test]
fn test_completed_to_in_session_is_terminal_rejection() {
    let err = TransitionValidator::default()
        .validate(BookingStatus::Completed, BookingStatus::InSession)
        .unwrap_err();
    assert_eq!(err.from, BookingStatus::Completed);
    assert_eq!(err.to, BookingStatus::InSession);
    assert!(err.is_terminal_rejection());
    assert!(err.to_string().contains("completed"));
}

#[test]
fn test_rescheduled_accepts_nothing() {
    let validator = TransitionValidator::default();
    for to in BookingStatus::ALL {
        assert_eq!(
            validator
                .validate(BookingStatus::Rescheduled, to)
                .unwrap_err()
                .reason,
            RejectionReason::NotInSuccessorSet
        );
    }
}

#[test]
fn test_validator_is_shareable_across_threads() {
    let validator = TransitionValidator::default();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let validator = validator.clone();
            std::thread::spawn(move || {
                validator
                    .validate(BookingStatus::Upcoming, BookingStatus::RunningLate)
                    .is_ok()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
