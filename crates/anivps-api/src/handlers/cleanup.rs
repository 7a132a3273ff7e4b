//! Janitor trigger handler.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use chrono::Utc;

use anivps_auth::secrets_match;
use anivps_core::error::AppError;

use crate::dto::response::CleanupResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the janitor API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// POST /api/cleanup-sessions
///
/// Rejected outright when no `janitor.api_key` is configured.
pub async fn cleanup_sessions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CleanupResponse>, ApiError> {
    let expected = state
        .config
        .janitor
        .api_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| AppError::authentication("Cleanup endpoint is not enabled"))?;
    let provided = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::authentication("Missing x-api-key header"))?;
    if !secrets_match(expected, provided) {
        return Err(AppError::authentication("Invalid API key").into());
    }

    let report = state.janitor.sweep(Utc::now()).await?;
    Ok(Json(CleanupResponse {
        success: true,
        deleted_count: report.deleted_count,
        deleted_sessions: report.deleted_sessions,
    }))
}
