//! AniVPS Server: VPS console session orchestration
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use anivps_api::{AppState, build_app};
use anivps_core::config::AppConfig;
use anivps_core::error::AppError;
use anivps_database::{DatabasePool, SessionLogStore, SessionStore};
use anivps_github::{GitHubClient, WorkflowDriver};
use anivps_worker::{CronScheduler, ProvisioningRunner};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file, environment overlay and variables
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("ANIVPS_CONFIG").unwrap_or_else(|_| "config/default".to_string());
    let env = std::env::var("ANIVPS_ENV").unwrap_or_else(|_| "development".to_string());

    AppConfig::load(&config_path, &env)
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
    tracing::info!("Starting AniVPS v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    let db = DatabasePool::connect(&config.database).await?;

    tracing::info!("Running database migrations...");
    anivps_database::migration::run_migrations(db.pool()).await?;
    tracing::info!("Database migrations complete");

    // ── Step 2: Initialize repositories ──────────────────────────
    let sessions: Arc<dyn SessionStore> = Arc::new(db.sessions());
    let logs: Arc<dyn SessionLogStore> = Arc::new(db.session_logs());

    // ── Step 3: Initialize provider client ───────────────────────
    let driver: Arc<dyn WorkflowDriver> = Arc::new(GitHubClient::new(&config.github)?);
    tracing::info!(api = %config.github.api_base_url, "GitHub client initialized");

    // ── Step 4: Initialize services ──────────────────────────────
    let state = AppState::build(
        config.clone(),
        Arc::clone(&sessions),
        logs,
        driver,
        Some(db.clone()),
    );

    // ── Step 5: Shutdown channel & provisioning worker ───────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker_handle = if config.worker.enabled {
        let worker_id = format!("worker-{}", std::process::id());
        let runner = ProvisioningRunner::new(
            Arc::clone(&sessions),
            Arc::clone(&state.controller),
            config.worker.clone(),
            worker_id,
        );
        let worker_cancel = shutdown_rx.clone();
        Some(tokio::spawn(async move {
            runner.run(worker_cancel).await;
        }))
    } else {
        tracing::warn!("Provisioning worker disabled; sessions will not advance");
        None
    };

    // ── Step 6: Janitor schedule ─────────────────────────────────
    let mut scheduler = if config.janitor.enabled {
        let scheduler = CronScheduler::new().await?;
        scheduler
            .register_janitor(Arc::clone(&state.janitor), &config.janitor.schedule)
            .await?;
        scheduler.start().await?;
        tracing::info!(schedule = %config.janitor.schedule, "Janitor scheduled");
        Some(scheduler)
    } else {
        None
    };

    // ── Step 7: Build and start HTTP server ──────────────────────
    let app = build_app(state);
    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("AniVPS server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 8: Drain background tasks ───────────────────────────
    if let Some(scheduler) = scheduler.as_mut() {
        if let Err(e) = scheduler.shutdown().await {
            tracing::warn!(error = %e, "Janitor scheduler did not shut down cleanly");
        }
    }
    if let Some(handle) = worker_handle {
        let grace = std::time::Duration::from_secs(config.server.shutdown_grace_seconds);
        if tokio::time::timeout(grace, handle).await.is_err() {
            tracing::warn!("Provisioning worker did not stop within the grace period");
        }
    }
    db.close().await;

    tracing::info!("AniVPS server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
