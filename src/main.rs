//! TourHub Server: booking priority classification and notification delivery.
//!
//! Main entry point that wires all crates together and starts the server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use tourhub_api::{AppState, build_app};
use tourhub_core::config::AppConfig;
use tourhub_core::{AppError, AppResult};
use tourhub_database::Stores;
use tourhub_service::{
    DispatchScheduler, InlineScheduler, NotificationPipeline, OrderService, PriorityClassifier,
    SenderRegistry, TemplateRegistry,
};
use tourhub_worker::jobs::notification_executor;
use tourhub_worker::{CronScheduler, DispatchQueue, WorkerRunner};

#[tokio::main]
async fn main() {
    let env = std::env::var("TOURHUB_ENV").unwrap_or_else(|_| "development".to_string());
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
async fn run(config: AppConfig) -> AppResult<()> {
    tracing::info!("Starting TourHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Stores ───────────────────────────────────────────
    let (stores, db) = Stores::from_config(&config.database).await?;

    // ── Step 2: Notification pipeline ────────────────────────────
    let pipeline = NotificationPipeline::new(
        &stores,
        SenderRegistry::with_defaults(),
        Arc::new(TemplateRegistry::with_builtin()),
        &config.notification,
    );
    tracing::info!(
        max_retries = config.notification.max_retries,
        retry_mode = ?config.notification.retry_mode,
        "Notification pipeline initialized"
    );

    // ── Step 3: Dispatch worker ──────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let (scheduler, worker_handle) = if config.worker.enabled {
        let (queue, receiver) = DispatchQueue::bounded(config.worker.queue_capacity);
        let runner = WorkerRunner::new(
            Arc::clone(&pipeline.dispatcher),
            config.worker.clone(),
            format!("worker-{}", std::process::id()),
        );
        let cancel = shutdown_rx.clone();
        let handle = tokio::spawn(async move { runner.run(receiver, cancel).await });
        let scheduler: Arc<dyn DispatchScheduler> = Arc::new(queue);
        (scheduler, Some(handle))
    } else {
        tracing::info!("Background worker disabled, dispatching inline");
        let scheduler: Arc<dyn DispatchScheduler> =
            Arc::new(InlineScheduler::new(Arc::clone(&pipeline.dispatcher)));
        (scheduler, None)
    };

    // ── Step 4: Maintenance schedule ─────────────────────────────
    let mut cron = if config.worker.scheduler_enabled {
        let executor = Arc::new(notification_executor(&pipeline, &config.notification));
        let cron = CronScheduler::new(executor).await?;
        cron.register_notification_jobs(&config.notification).await?;
        cron.start().await?;
        Some(cron)
    } else {
        None
    };

    // ── Step 5: Services and HTTP server ─────────────────────────
    let orders = Arc::new(OrderService::new(
        Arc::clone(&stores.orders),
        Arc::clone(&stores.users),
        PriorityClassifier::new(),
        scheduler,
        Arc::clone(&pipeline.dispatcher),
    ));
    let state = AppState::new(config.clone(), db.clone(), orders, pipeline);
    let app = build_app(state);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    tracing::info!(address = %addr, "TourHub server listening");

    // ── Step 6: Graceful shutdown ────────────────────────────────
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    })
    .await
    .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    if let Some(cron) = cron.as_mut() {
        cron.shutdown().await?;
    }

    if let Some(handle) = worker_handle {
        tracing::info!("Waiting for the dispatch worker to drain...");
        let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
        if tokio::time::timeout(grace, handle).await.is_err() {
            tracing::warn!("Dispatch worker did not stop within the shutdown grace period");
        }
    }

    if let Some(db) = db {
        db.close().await;
    }

    tracing::info!("TourHub server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
