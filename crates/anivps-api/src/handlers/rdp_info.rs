//! Credential callback posted by the running workflow.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;

use anivps_auth::secrets_match;
use anivps_core::error::AppError;

use crate::dto::request::RdpInfoRequest;
use crate::dto::response::{ApiResponse, RdpInfoResponse};
use crate::dto::validate_body;
use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the callback secret.
pub const CALLBACK_KEY_HEADER: &str = "x-callback-key";

/// POST /api/update-rdp-info
pub async fn update_rdp_info(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RdpInfoRequest>,
) -> Result<Json<ApiResponse<RdpInfoResponse>>, ApiError> {
    if let Some(expected) = state.config.callback.secret.as_deref().filter(|s| !s.is_empty()) {
        let provided = headers
            .get(CALLBACK_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !secrets_match(expected, provided) {
            return Err(AppError::authentication("Invalid callback key").into());
        }
    }
    validate_body(&req)?;

    let session = state
        .controller
        .record_rdp_info(&req.repo_name, &req.ngrok_url, &req.rdp_user, &req.rdp_password)
        .await?;

    Ok(Json(ApiResponse::ok(RdpInfoResponse {
        session_id: session.id,
        github_repo: session.github_repo,
        status: session.status,
        started_at: session.started_at,
    })))
}
