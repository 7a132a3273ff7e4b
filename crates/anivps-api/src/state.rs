//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use anivps_auth::JwtDecoder;
use anivps_core::config::AppConfig;
use anivps_database::{DatabasePool, SessionLogStore, SessionStore};
use anivps_github::WorkflowDriver;
use anivps_service::{
    CredentialVault, Janitor, LogBus, ProvisioningController, SessionLogger, SessionService,
};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Process start, for the health endpoint
    pub started_at: Instant,

    // ── Infrastructure ───────────────────────────────────────
    /// PostgreSQL pool; absent when running on the in-memory store
    pub db: Option<DatabasePool>,
    /// Provider tokens of in-flight sessions
    pub vault: Arc<CredentialVault>,
    /// Live log fan-out
    pub log_bus: Arc<LogBus>,

    // ── Auth ─────────────────────────────────────────────────
    /// Bearer token verifier
    pub jwt_decoder: Arc<JwtDecoder>,

    // ── Services ─────────────────────────────────────────────
    /// Session state machine
    pub controller: Arc<ProvisioningController>,
    /// Session queries, logs and analytics
    pub session_service: Arc<SessionService>,
    /// Defunct-session sweep
    pub janitor: Arc<Janitor>,
}

impl AppState {
    /// Wire every service over the given stores and provider driver.
    pub fn build(
        config: AppConfig,
        sessions: Arc<dyn SessionStore>,
        logs: Arc<dyn SessionLogStore>,
        driver: Arc<dyn WorkflowDriver>,
        db: Option<DatabasePool>,
    ) -> Self {
        let vault = Arc::new(CredentialVault::new());
        let bus = Arc::new(LogBus::default());
        let logger = SessionLogger::new(Arc::clone(&logs), Arc::clone(&bus));

        let controller = Arc::new(ProvisioningController::new(
            Arc::clone(&sessions),
            logger,
            driver,
            Arc::clone(&vault),
            config.provisioning.clone(),
        ));
        let session_service = Arc::new(SessionService::new(
            Arc::clone(&sessions),
            logs,
            Arc::clone(&bus),
        ));
        let janitor = Arc::new(Janitor::new(
            sessions,
            Arc::clone(&vault),
            config.janitor.clone(),
        ));

        Self {
            jwt_decoder: Arc::new(JwtDecoder::new(&config.auth)),
            config: Arc::new(config),
            started_at: Instant::now(),
            db,
            vault,
            log_bus: bus,
            controller,
            session_service,
            janitor,
        }
    }
}
