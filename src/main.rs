//! Wayfare booking engine: maintenance server.
//!
//! Loads configuration, connects to PostgreSQL, wires the booking engine,
//! and runs the maintenance scheduler until shutdown. Inbound transports
//! embed [`wayfare_service::BookingEngine`] directly.

use std::sync::Arc;

use tracing;
use tracing_subscriber::{EnvFilter, fmt};

use wayfare_core::clock::SystemClock;
use wayfare_core::config::AppConfig;
use wayfare_core::error::AppError;
use wayfare_database::DatabasePool;
use wayfare_service::{BookingEngine, EngineStores, MemoryEventBus};
use wayfare_worker::CronScheduler;

#[tokio::main]
async fn main() {
    let env = std::env::var("WAYFARE_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Wayfare booking engine v{}", env!("CARGO_PKG_VERSION"));

    let db = DatabasePool::open(&config.database).await?;

    let events = MemoryEventBus::new(config.events.buffer_size);
    let engine = BookingEngine::new(
        EngineStores::postgres(db.stores()),
        Arc::new(events),
        Arc::new(SystemClock),
        config.booking.clone(),
    )?;
    tracing::info!(
        commission_rate_bps = config.booking.commission_rate_bps,
        pending_expiry_minutes = ?config.booking.pending_expiry_minutes,
        auto_complete_after_days = ?config.booking.auto_complete_after_days,
        "Booking engine ready"
    );

    let mut scheduler = if config.worker.enabled {
        let executor = wayfare_worker::jobs::default_executor(&engine, &config.worker);
        let scheduler = CronScheduler::new(Arc::new(executor)).await?;
        scheduler.register_default_tasks(&config.worker).await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Maintenance worker disabled");
        None
    };

    shutdown_signal().await;
    tracing::info!("Shutdown signal received");

    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.shutdown().await?;
    }
    db.close().await;
    tracing::info!("Wayfare stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
