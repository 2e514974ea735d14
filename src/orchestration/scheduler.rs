//! # Booking Status Scheduler
//!
//! Periodic driver that moves bookings along their time-based lifecycle.
//!
//! ## Pass
//!
//! 1. Read active bookings from the store (bounded by the pass deadline).
//! 2. Evaluate each booking on a bounded worker pool. A worker keeps applying
//!    rules to its freshly written snapshot until none fires, so a booking that
//!    missed several windows walks every edge in one pass.
//! 3. A version conflict means someone else wrote first: the booking is left for
//!    the next pass, never retried blindly.
//!
//! ## Loop
//!
//! The first pass runs immediately on start. A successful pass waits the tick
//! interval; a failed pass waits an exponential backoff capped at the configured
//! ceiling. `stop()` lets an in-flight pass finish before the loop exits.

use crate::config::SchedulerConfig;
use crate::logging::{log_error, log_pass};
use crate::models::{Booking, Transition};
use crate::orchestration::clock::Clock;
use crate::orchestration::stats::{SchedulerStats, SchedulerStatsSnapshot};
use crate::orchestration::transition_service::{ApplyOutcome, TransitionService, TransitionServiceError};
use crate::state_machine::{AutoTransitionPolicy, BookingStatus, TransitionError};
use crate::store::{BookingStore, StoreError};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, watch, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

const STATE_CHANGE_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Booking store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("Scheduler pass {pass_number} exceeded its {deadline_ms}ms deadline")]
    PassTimedOut { pass_number: u64, deadline_ms: u64 },

    #[error("Scheduler is already running")]
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Idle,
    Scanning,
    Backoff,
    Stopped,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Scanning => write!(f, "scanning"),
            Self::Backoff => write!(f, "backoff"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Why a booking's chain of transitions ended early
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaltReason {
    VersionConflict { current_version: u64 },
    NotFound,
    Rejected(TransitionError),
    Failed(String),
}

/// What a pass did to one booking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingOutcome {
    pub booking_id: Uuid,
    pub applied: Vec<Transition>,
    pub halted: Option<HaltReason>,
}

/// Summary of one completed pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub pass_number: u64,
    pub examined: usize,
    pub transitions: Vec<Transition>,
    pub conflicts: usize,
    pub rejections: usize,
    pub failures: usize,
    pub duration: Duration,
}

impl PassReport {
    fn record(&mut self, outcome: BookingOutcome) {
        self.transitions.extend(outcome.applied);
        match outcome.halted {
            Some(HaltReason::VersionConflict { .. }) => self.conflicts += 1,
            Some(HaltReason::Rejected(_)) => self.rejections += 1,
            Some(HaltReason::Failed(_)) => self.failures += 1,
            Some(HaltReason::NotFound) | None => {}
        }
    }

    pub fn transitioned(&self) -> usize {
        self.transitions.len()
    }
}

/// Exponential delay after failed passes
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Option<Duration>,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            current: None,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let next = match self.current {
            None => self.initial,
            Some(current) => current.saturating_mul(2).min(self.max),
        };
        self.current = Some(next);
        next
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}

#[derive(Debug)]
pub struct BookingStatusScheduler {
    store: Arc<dyn BookingStore>,
    service: Arc<TransitionService>,
    policy: AutoTransitionPolicy,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
    stats: Arc<SchedulerStats>,
    state: RwLock<SchedulerState>,
    state_changes: broadcast::Sender<SchedulerState>,
    pass_counter: AtomicU64,
    shutdown_tx: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl BookingStatusScheduler {
    pub fn new(
        store: Arc<dyn BookingStore>,
        service: Arc<TransitionService>,
        policy: AutoTransitionPolicy,
        config: SchedulerConfig,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        let (state_changes, _) = broadcast::channel(STATE_CHANGE_CAPACITY);
        let clock = Arc::clone(service.clock());
        Self {
            store,
            service,
            policy,
            clock,
            config,
            stats: Arc::new(SchedulerStats::new()),
            state: RwLock::new(SchedulerState::Idle),
            state_changes,
            pass_counter: AtomicU64::new(0),
            shutdown_tx,
            handle: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.read()
    }

    /// Every state change from now on, in order
    pub fn subscribe_state(&self) -> broadcast::Receiver<SchedulerState> {
        self.state_changes.subscribe()
    }

    pub fn stats(&self) -> SchedulerStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.handle.lock().is_some()
    }

    /// Spawn the periodic loop; the first pass runs immediately
    pub fn start(self: &Arc<Self>) -> Result<(), SchedulerError> {
        let mut handle = self.handle.lock();
        if handle.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.shutdown_tx.send_replace(false);
        self.set_state(SchedulerState::Idle);
        let shutdown = self.shutdown_tx.subscribe();
        *handle = Some(tokio::spawn(Arc::clone(self).run_loop(shutdown)));

        info!(
            tick_interval_seconds = self.config.tick_interval_seconds,
            worker_concurrency = self.config.worker_concurrency,
            "Booking status scheduler started"
        );
        Ok(())
    }

    /// Stop the loop and wait for an in-flight pass to finish. Idempotent.
    pub async fn stop(&self) {
        self.shutdown_tx.send_replace(true);
        let handle = self.handle.lock().take();

        match handle {
            Some(handle) => {
                if let Err(e) = handle.await {
                    log_error("scheduler", "stop", &e.to_string(), None);
                }
                info!("Booking status scheduler stopped");
            }
            None => debug!("Booking status scheduler already stopped"),
        }
        self.set_state(SchedulerState::Stopped);
    }

    async fn run_loop(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut backoff = Backoff::new(self.config.backoff_initial(), self.config.backoff_max());

        loop {
            if *shutdown.borrow() {
                break;
            }

            let delay = match self.scan().await {
                Ok(_) => {
                    backoff.reset();
                    self.config.tick_interval()
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    self.set_state(SchedulerState::Backoff);
                    warn!(
                        error = %e,
                        retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Scheduler pass failed - backing off"
                    );
                    delay
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(delay) => self.set_state(SchedulerState::Idle),
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("Shutdown signal received");
                        break;
                    }
                }
            }
        }

        self.set_state(SchedulerState::Stopped);
    }

    /// Run one pass now, returning to `Idle` whatever the outcome
    pub async fn run_pass(&self) -> Result<PassReport, SchedulerError> {
        let result = self.scan().await;
        if result.is_err() {
            self.set_state(SchedulerState::Idle);
        }
        result
    }

    /// One pass; a failed pass leaves the state for the caller to decide
    async fn scan(&self) -> Result<PassReport, SchedulerError> {
        let pass_number = self.pass_counter.fetch_add(1, Ordering::Relaxed) + 1;
        self.set_state(SchedulerState::Scanning);

        let started = Instant::now();
        let deadline = started + self.config.max_pass_deadline();

        let bookings = match timeout_at(deadline, self.store.list_active()).await {
            Ok(Ok(bookings)) => bookings,
            Ok(Err(e)) => return Err(self.fail_pass(SchedulerError::StoreUnavailable(e))),
            Err(_) => return Err(self.fail_pass(self.timed_out(pass_number))),
        };

        let now = self.clock.now();
        let examined = bookings.len();
        self.stats.record_examined(examined as u64);

        let semaphore = Arc::new(Semaphore::new(self.config.worker_concurrency));
        let mut workers = JoinSet::new();
        let mut deferred = 0;

        for (index, booking) in bookings.into_iter().enumerate() {
            let permit = match timeout_at(deadline, Arc::clone(&semaphore).acquire_owned()).await {
                Ok(Ok(permit)) => permit,
                _ => {
                    deferred = examined - index;
                    break;
                }
            };

            let service = Arc::clone(&self.service);
            let stats = Arc::clone(&self.stats);
            let policy = self.policy;
            workers.spawn(async move {
                let outcome = process_booking(&service, &policy, &stats, booking, now).await;
                drop(permit);
                outcome
            });
        }

        let mut report = PassReport {
            pass_number,
            examined,
            ..PassReport::default()
        };

        loop {
            match timeout_at(deadline, workers.join_next()).await {
                Ok(Some(Ok(outcome))) => report.record(outcome),
                Ok(Some(Err(e))) => {
                    self.stats.record_booking_failure();
                    log_error("scheduler", "booking_worker", &e.to_string(), None);
                    report.failures += 1;
                }
                Ok(None) => break,
                Err(_) => {
                    // Detached workers still finish their record and publish
                    workers.detach_all();
                    self.stats.record_deferred(deferred as u64);
                    return Err(self.fail_pass(self.timed_out(pass_number)));
                }
            }
        }

        if deferred > 0 {
            self.stats.record_deferred(deferred as u64);
            return Err(self.fail_pass(self.timed_out(pass_number)));
        }

        report.duration = started.elapsed();
        self.stats.record_pass_completed();
        self.set_state(SchedulerState::Idle);

        log_pass(
            pass_number,
            report.examined,
            report.transitioned(),
            report.conflicts,
            report.failures,
            u64::try_from(report.duration.as_millis()).unwrap_or(u64::MAX),
        );

        Ok(report)
    }

    fn timed_out(&self, pass_number: u64) -> SchedulerError {
        SchedulerError::PassTimedOut {
            pass_number,
            deadline_ms: u64::try_from(self.config.max_pass_deadline().as_millis())
                .unwrap_or(u64::MAX),
        }
    }

    fn fail_pass(&self, error: SchedulerError) -> SchedulerError {
        self.stats.record_pass_failed();
        log_error("scheduler", "run_pass", &error.to_string(), None);
        error
    }

    fn set_state(&self, state: SchedulerState) {
        *self.state.write() = state;
        // No subscribers is fine
        let _ = self.state_changes.send(state);
    }
}

/// Apply rules to one booking until none fires or a write does not go through
async fn process_booking(
    service: &TransitionService,
    policy: &AutoTransitionPolicy,
    stats: &SchedulerStats,
    booking: Booking,
    now: DateTime<Utc>,
) -> BookingOutcome {
    let booking_id = booking.id;
    let mut current = booking;
    let mut applied = Vec::new();

    // A chain can never be longer than the number of statuses
    for _ in 0..BookingStatus::ALL.len() {
        let Some(auto) = policy.evaluate(&current, now) else {
            break;
        };

        let halted = match service.apply_automatic(&current, auto).await {
            Ok(ApplyOutcome::Applied(result)) => {
                stats.record_transition();
                applied.push(result.transition);
                current = result.booking;
                continue;
            }
            Ok(ApplyOutcome::VersionConflict { current_version }) => {
                stats.record_conflict();
                HaltReason::VersionConflict { current_version }
            }
            Ok(ApplyOutcome::NotFound) => HaltReason::NotFound,
            Err(TransitionServiceError::Rejected(error)) => {
                stats.record_rejection();
                warn!(booking_id = %booking_id, error = %error, "Automatic transition rejected");
                HaltReason::Rejected(error)
            }
            Err(e) => {
                stats.record_booking_failure();
                log_error("scheduler", "apply_automatic", &e.to_string(), Some(&booking_id.to_string()));
                HaltReason::Failed(e.to_string())
            }
        };

        return BookingOutcome {
            booking_id,
            applied,
            halted: Some(halted),
        };
    }

    BookingOutcome {
        booking_id,
        applied,
        halted: None,
    }
}
