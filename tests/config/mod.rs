use booking_lifecycle::config::{ConfigManager, ConfigurationError};
use booking_lifecycle::notifier::NotificationChannel;
use booking_lifecycle::state_machine::BookingStatus;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

fn repo_config_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config")
}

#[test]
fn test_shipped_base_config_loads() {
    let manager =
        ConfigManager::load_from_directory_with_env(Some(repo_config_dir()), "development")
            .unwrap();
    let config = manager.config();

    assert_eq!(config.scheduler.tick_interval(), Duration::from_secs(60));
    assert_eq!(config.policy.late_grace_minutes, 10);
    assert_eq!(config.notifications.reminder_channel, NotificationChannel::Sms);
    assert!(config.transitions.is_none());
}

#[test]
fn test_shipped_test_overlay_applies() {
    let manager =
        ConfigManager::load_from_directory_with_env(Some(repo_config_dir()), "test").unwrap();
    let config = manager.config();

    assert_eq!(config.scheduler.tick_interval_seconds, 1);
    assert_eq!(config.scheduler.worker_concurrency, 4);
    // Untouched by the overlay
    assert_eq!(config.alerts.dedupe_window_seconds, 300);
}

#[test]
fn test_environment_variable_overrides_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("booking-lifecycle.yaml"),
        "alerts:\n  ttl_seconds: 3600\n",
    )
    .unwrap();

    std::env::set_var("BOOKING_LIFECYCLE__ALERTS__TTL_SECONDS", "120");
    let result =
        ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "staging");
    std::env::remove_var("BOOKING_LIFECYCLE__ALERTS__TTL_SECONDS");

    assert_eq!(result.unwrap().config().alerts.ttl_seconds, 120);
}

#[test]
fn test_invalid_value_in_file_rejected() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("booking-lifecycle.yaml"),
        "scheduler:\n  tick_interval_seconds: 0\n",
    )
    .unwrap();

    let err = ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test")
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::InvalidValue { .. }));
}

#[test]
fn test_custom_transition_table_loaded_from_yaml() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("booking-lifecycle.yml"),
        r#"
transitions:
  scheduled: [upcoming, cancelled, rescheduled]
  confirmed_client: [upcoming]
  reminder_sent: [upcoming]
  upcoming: [client_arrived, running_late, no_show, cancelled]
  client_arrived: [in_session]
  in_session: [completed]
  running_late: [in_session, no_show]
  completed: []
  no_show: []
  cancelled: []
  rescheduled: []
"#,
    )
    .unwrap();

    let manager =
        ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test")
            .unwrap();
    let registry = manager.config().registry().unwrap();
    assert!(!registry.allows(BookingStatus::Scheduled, BookingStatus::ConfirmedClient));
    assert!(registry.allows(BookingStatus::Upcoming, BookingStatus::NoShow));
}

#[test]
fn test_malformed_yaml_reports_load_failure() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("booking-lifecycle.yaml"),
        "scheduler: [not, a, map\n",
    )
    .unwrap();

    let err = ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test")
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::LoadFailed { .. }));
}
