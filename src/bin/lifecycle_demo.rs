//! # Lifecycle Demo
//!
//! Runs the lifecycle engine against an in-memory store seeded with a handful of
//! bookings around the current time, logging every transition until Ctrl-C.

use anyhow::Context;
use booking_lifecycle::config::ConfigManager;
use booking_lifecycle::logging::init_structured_logging;
use booking_lifecycle::models::NewBooking;
use booking_lifecycle::notifier::TracingNotifier;
use booking_lifecycle::orchestration::{LifecycleSystem, SystemClock};
use booking_lifecycle::state_machine::BookingStatus;
use booking_lifecycle::store::{BookingStore, InMemoryBookingStore};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_structured_logging();

    let config_manager =
        ConfigManager::load_or_default().context("failed to load booking lifecycle configuration")?;
    let offset_minutes = i64::from(config_manager.config().policy.utc_offset_minutes);

    let store = Arc::new(InMemoryBookingStore::new());
    seed_bookings(&store, offset_minutes).await?;

    let system = LifecycleSystem::bootstrap(
        config_manager,
        store.clone(),
        Arc::new(TracingNotifier),
        Arc::new(SystemClock),
    )?;

    let mut events = system.publisher().subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            info!(
                booking_id = %event.booking_id,
                from = %event.from,
                to = %event.to,
                "Demo observed transition"
            );
        }
    });

    system.start()?;
    info!("Lifecycle demo running - press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;

    system.shutdown().await;
    printer.abort();

    let status = serde_json::to_string_pretty(&system.status())?;
    println!("{status}");
    for (status, count) in booking_lifecycle::status_summary(&store.snapshot()) {
        if count > 0 {
            println!("{:>18}: {count}", status.label());
        }
    }

    Ok(())
}

/// Bookings positioned so each automatic rule has something to do on the first pass
async fn seed_bookings(store: &InMemoryBookingStore, offset_minutes: i64) -> anyhow::Result<()> {
    let local_now = Utc::now().naive_utc() + Duration::minutes(offset_minutes);

    let slots = [
        ("client-a", "psychology", Duration::hours(3), 60),
        ("client-b", "physiotherapy", Duration::minutes(-20), 45),
        ("client-c", "speech therapy", Duration::hours(-2), 30),
        ("client-d", "occupational therapy", Duration::days(3), 60),
    ];

    for (client, therapy, starts_in, minutes) in slots {
        let start = local_now + starts_in;
        let end = start + Duration::minutes(minutes);
        if end.date() != start.date() {
            info!(client, "Skipping demo booking that would cross midnight");
            continue;
        }
        let booking = store
            .insert(NewBooking::new(client, therapy, start.date(), start.time(), end.time()))
            .await
            .with_context(|| format!("failed to seed booking for {client}"))?;
        info!(booking_id = %booking.id, client, status = %BookingStatus::Scheduled, "Seeded booking");
    }

    Ok(())
}
