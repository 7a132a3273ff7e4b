//! Kill/start management handler.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use anivps_core::error::AppError;
use anivps_entity::session::VpsSession;
use anivps_service::RemoteCancel;

use crate::dto::request::{ManageAction, ManageSessionRequest};
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// Result of a management action.
#[derive(Debug, Serialize)]
pub struct ManageResponse {
    pub action: ManageAction,
    pub session: VpsSession,
    /// Present for `kill` only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_cancel: Option<RemoteCancel>,
}

/// POST /api/manage-session
pub async fn manage_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<ManageSessionRequest>,
) -> Result<Json<ApiResponse<ManageResponse>>, ApiError> {
    let response = match req.action {
        ManageAction::Kill => {
            let outcome = state
                .controller
                .kill(&auth, req.session_id, req.workflow_run_id, req.github_token)
                .await?;
            ManageResponse {
                action: req.action,
                session: outcome.session,
                remote_cancel: Some(outcome.remote_cancel),
            }
        }
        ManageAction::Start => {
            let token = req
                .github_token
                .as_deref()
                .ok_or_else(|| AppError::validation("githubToken is required to start a session"))?;
            let session = state.controller.start(&auth, req.session_id, token).await?;
            ManageResponse {
                action: req.action,
                session,
                remote_cancel: None,
            }
        }
    };

    Ok(Json(ApiResponse::ok(response)))
}
