//! Route definitions for the VPS console HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.
//! The router receives `AppState` and passes it to all handlers via Axum's `State` extractor.

use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers;
use crate::state::AppState;

/// Build the API router with every route bound to `state`.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(health_routes())
        .merge(session_routes())
        .merge(management_routes())
        .merge(callback_routes())
        .merge(admin_routes());

    Router::new().nest("/api", api_routes).with_state(state)
}

/// Liveness and dependency checks.
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/detailed", get(handlers::health::health_detailed))
}

/// Session CRUD, logs and the live log stream.
fn session_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/sessions",
            get(handlers::sessions::list_sessions).post(handlers::sessions::create_session),
        )
        .route(
            "/sessions/{id}",
            get(handlers::sessions::get_session).delete(handlers::sessions::delete_session),
        )
        .route(
            "/sessions/{id}/connect",
            post(handlers::sessions::connect_session),
        )
        .route("/sessions/{id}/logs", get(handlers::sessions::session_logs))
        .route("/sessions/{id}/logs/stream", get(handlers::ws::log_stream))
        .route("/analytics", get(handlers::analytics::analytics))
}

/// Kill/start and the janitor trigger.
fn management_routes() -> Router<AppState> {
    Router::new()
        .route("/manage-session", post(handlers::manage::manage_session))
        .route(
            "/cleanup-sessions",
            post(handlers::cleanup::cleanup_sessions),
        )
}

/// Called by the running workflow.
fn callback_routes() -> Router<AppState> {
    Router::new().route("/update-rdp-info", post(handlers::rdp_info::update_rdp_info))
}

fn admin_routes() -> Router<AppState> {
    Router::new().route("/admin/sessions", get(handlers::admin::list_all_sessions))
}
