mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use carecall_alerts::{AlertService, Collaborators, EscalationScheduler};
use carecall_db::{PgAlertStore, PgDeviceDirectory, PgHistoryStore, PgPatientDirectory, PgStaffDirectory};
use carecall_events::{EventBus, EventLogger};

use crate::config::{LogFormat, WorkerConfig};

/// How long background tasks get to finish after shutdown is requested.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = WorkerConfig::from_env().context("Invalid worker configuration")?;

    // --- Tracing ---
    init_tracing(config.log_format);
    tracing::info!(
        db_max_connections = config.db_max_connections,
        interval_secs = config.scheduler.interval.as_secs(),
        timeout_minutes = ?config.scheduler.timeout_minutes,
        concurrency = config.scheduler.concurrency,
        "Loaded worker configuration"
    );

    // --- Database ---
    let pool = carecall_db::create_pool(&config.database_url, config.db_max_connections)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    carecall_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database health check passed");

    carecall_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    let logger_handle = tokio::spawn(EventLogger::run(event_bus.subscribe()));
    tracing::info!("Event bus created, event logger started");

    // --- Engine ---
    let service = AlertService::new(Collaborators {
        alerts: Arc::new(PgAlertStore::new(pool.clone())),
        history: Arc::new(PgHistoryStore::new(pool.clone())),
        patients: Arc::new(PgPatientDirectory::new(pool.clone())),
        staff: Arc::new(PgStaffDirectory::new(pool.clone())),
        devices: Arc::new(PgDeviceDirectory::new(pool.clone())),
        notifier: event_bus.clone(),
    });

    let cancel = CancellationToken::new();
    let scheduler = EscalationScheduler::new(service, config.scheduler.clone());
    let scheduler_cancel = cancel.clone();
    let scheduler_handle = tokio::spawn(async move {
        scheduler.run(scheduler_cancel).await;
    });

    shutdown_signal().await;

    // --- Shutdown ---
    cancel.cancel();
    if tokio::time::timeout(SHUTDOWN_GRACE, scheduler_handle).await.is_err() {
        tracing::warn!("Escalation scheduler did not stop within the grace period");
    }

    // Dropping the last bus handle closes the channel and stops the logger.
    drop(event_bus);
    if tokio::time::timeout(SHUTDOWN_GRACE, logger_handle).await.is_err() {
        tracing::warn!("Event logger did not stop within the grace period");
    }

    pool.close().await;
    tracing::info!("Worker shut down");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "carecall_worker=debug,carecall_alerts=debug,carecall_events=info".into());

    match format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

/// Wait for SIGINT or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
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
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
