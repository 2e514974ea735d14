//! # Lifecycle System Bootstrap
//!
//! Wires the lifecycle components together from a loaded configuration and owns
//! their background tasks.
//!
//! ```rust,no_run
//! use booking_lifecycle::config::ConfigManager;
//! use booking_lifecycle::notifier::TracingNotifier;
//! use booking_lifecycle::orchestration::{LifecycleSystem, SystemClock};
//! use booking_lifecycle::store::InMemoryBookingStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> booking_lifecycle::Result<()> {
//! let config_manager = ConfigManager::load_or_default()?;
//! let system = LifecycleSystem::bootstrap(
//!     config_manager,
//!     Arc::new(InMemoryBookingStore::new()),
//!     Arc::new(TracingNotifier),
//!     Arc::new(SystemClock),
//! )?;
//! system.start()?;
//! // ...
//! system.shutdown().await;
//! # Ok(())
//! # }
//! ```

use crate::alerts::AlertAggregator;
use crate::audit::TransitionLog;
use crate::config::ConfigManager;
use crate::error::Result;
use crate::events::EventPublisher;
use crate::notifier::Notifier;
use crate::orchestration::clock::Clock;
use crate::orchestration::notification_dispatcher::NotificationDispatcher;
use crate::orchestration::scheduler::{BookingStatusScheduler, SchedulerState};
use crate::orchestration::stats::SchedulerStatsSnapshot;
use crate::orchestration::transition_service::TransitionService;
use crate::state_machine::{AutoTransitionPolicy, TransitionValidator};
use crate::store::BookingStore;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Running set of lifecycle components
#[derive(Debug)]
pub struct LifecycleSystem {
    config_manager: Arc<ConfigManager>,
    service: Arc<TransitionService>,
    scheduler: Arc<BookingStatusScheduler>,
    alerts: Arc<AlertAggregator>,
    dispatcher: Arc<NotificationDispatcher>,
    log: Arc<TransitionLog>,
    publisher: EventPublisher,
    shutdown_tx: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

/// System status information
#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    pub running: bool,
    pub environment: String,
    pub scheduler_state: SchedulerState,
    pub scheduler_stats: SchedulerStatsSnapshot,
    pub transitions_recorded: u64,
    pub active_alerts: usize,
    pub event_subscribers: usize,
}

impl LifecycleSystem {
    /// Build every component; configuration problems fail here, before anything runs
    pub fn bootstrap(
        config_manager: Arc<ConfigManager>,
        store: Arc<dyn BookingStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let config = config_manager.config();

        let registry = Arc::new(config.registry()?);
        let policy = AutoTransitionPolicy::from_config(&config.policy)?;
        let alerts = Arc::new(AlertAggregator::from_config(&config.alerts)?);

        let log = Arc::new(TransitionLog::new());
        let publisher = EventPublisher::new(config.events.channel_capacity);

        let service = Arc::new(TransitionService::new(
            Arc::clone(&store),
            TransitionValidator::new(registry),
            Arc::clone(&log),
            publisher.clone(),
            Arc::clone(&notifier),
            clock,
            config.notifications.clone(),
        ));

        let scheduler = Arc::new(BookingStatusScheduler::new(
            store,
            Arc::clone(&service),
            policy,
            config.scheduler.clone(),
        ));

        let dispatcher = Arc::new(NotificationDispatcher::new(
            notifier,
            config.notifications.default_channel,
            config.notifications.timeout(),
        ));

        let (shutdown_tx, _) = watch::channel(false);

        info!(
            environment = %config_manager.environment(),
            "🚀 Booking lifecycle system bootstrapped"
        );

        Ok(Self {
            config_manager,
            service,
            scheduler,
            alerts,
            dispatcher,
            log,
            publisher,
            shutdown_tx,
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Start the subscribers, then the scheduler
    pub fn start(&self) -> Result<()> {
        {
            let mut tasks = self.tasks.lock();
            if !tasks.is_empty() {
                warn!("Lifecycle system already started");
                return Ok(());
            }

            self.shutdown_tx.send_replace(false);
            tasks.push(self.alerts.spawn(
                self.publisher.subscribe(),
                self.shutdown_tx.subscribe(),
                Arc::clone(self.service.clock()),
            ));
            tasks.push(self.dispatcher.spawn(
                self.publisher.subscribe(),
                self.shutdown_tx.subscribe(),
            ));
        }

        self.scheduler.start()?;
        info!("Booking lifecycle system started");
        Ok(())
    }

    /// Stop the scheduler (letting its pass finish), then the subscribers. Idempotent.
    pub async fn shutdown(&self) {
        self.scheduler.stop().await;
        self.shutdown_tx.send_replace(true);

        let tasks: Vec<JoinHandle<()>> = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Lifecycle background task ended abnormally");
            }
        }
        info!("🛑 Booking lifecycle system shut down");
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn status(&self) -> SystemStatus {
        SystemStatus {
            running: self.is_running(),
            environment: self.config_manager.environment().to_string(),
            scheduler_state: self.scheduler.state(),
            scheduler_stats: self.scheduler.stats(),
            transitions_recorded: self.log.len(),
            active_alerts: self.alerts.active_alerts(self.service.clock().now()).len(),
            event_subscribers: self.publisher.subscriber_count(),
        }
    }

    pub fn service(&self) -> &Arc<TransitionService> {
        &self.service
    }

    pub fn scheduler(&self) -> &Arc<BookingStatusScheduler> {
        &self.scheduler
    }

    pub fn alerts(&self) -> &Arc<AlertAggregator> {
        &self.alerts
    }

    pub fn transition_log(&self) -> &Arc<TransitionLog> {
        &self.log
    }

    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }

    pub fn config_manager(&self) -> &Arc<ConfigManager> {
        &self.config_manager
    }
}
