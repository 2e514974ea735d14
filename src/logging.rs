//! # Structured Logging Module
//!
//! Environment-aware structured logging that outputs to both console and a JSON
//! file, plus helpers that give lifecycle events a consistent field layout.

use crate::constants::config_files;
use crate::models::Transition;
use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<Option<WorkerGuard>> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);

        let console_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_level(true)
            .with_ansi(true)
            .with_filter(env_filter(log_level));

        let log_dir = PathBuf::from("log");
        let pid = process::id();
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        let log_filename = format!("booking-lifecycle.{environment}.{pid}.{timestamp}.log");

        // No file layer when the log directory cannot be created
        let (file_layer, guard) = match fs::create_dir_all(&log_dir) {
            Ok(()) => {
                let file_appender = tracing_appender::rolling::never(&log_dir, &log_filename);
                let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
                let layer = fmt::layer()
                    .with_writer(file_writer)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_level(true)
                    .with_ansi(false)
                    .json()
                    .with_filter(env_filter(log_level));
                (Some(layer), Some(guard))
            }
            Err(_) => (None, None),
        };

        let subscriber = tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer);

        // A global subscriber may already be set by an embedding application
        if subscriber.try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            pid = pid,
            environment = %environment,
            log_file = %log_dir.join(&log_filename).display(),
            file_output = guard.is_some(),
            "🔧 STRUCTURED LOGGING: Initialized"
        );

        guard
    });
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var(config_files::ENVIRONMENT_VARIABLE)
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| config_files::DEFAULT_ENVIRONMENT.to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

/// Log an applied transition
pub fn log_transition(transition: &Transition) {
    tracing::info!(
        booking_id = %transition.booking_id,
        from = %transition.from,
        to = %transition.to,
        triggered_by = %transition.triggered_by,
        actor = transition.actor.as_deref(),
        version = transition.version,
        reason = %transition.reason,
        timestamp = %transition.timestamp.to_rfc3339(),
        "🔁 BOOKING_TRANSITION"
    );
}

/// Log the outcome of one scheduler pass
pub fn log_pass(
    pass_number: u64,
    examined: usize,
    transitioned: usize,
    conflicts: usize,
    failures: usize,
    duration_ms: u64,
) {
    tracing::info!(
        pass_number = pass_number,
        examined = examined,
        transitioned = transitioned,
        conflicts = conflicts,
        failures = failures,
        duration_ms = duration_ms,
        "⏱️ SCHEDULER_PASS"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "❌ ERROR"
    );
}
