//! Health check handlers.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, DetailedHealthResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    }))
}

/// GET /api/health/detailed
pub async fn health_detailed(
    State(state): State<AppState>,
) -> Json<ApiResponse<DetailedHealthResponse>> {
    let (status, database, pool) = match &state.db {
        Some(db) => match db.health_check().await {
            Ok(true) => ("ok", "connected", Some(db.stats())),
            _ => ("degraded", "unreachable", Some(db.stats())),
        },
        None => ("ok", "in-memory", None),
    };

    Json(ApiResponse::ok(DetailedHealthResponse {
        status: status.to_string(),
        database: database.to_string(),
        pool,
        held_tokens: state.vault.len().await,
        log_channels: state.log_bus.channel_count().await,
    }))
}
