//! Admin handlers.

use axum::Json;
use axum::extract::{Query, State};

use anivps_core::types::pagination::PageResponse;
use anivps_entity::session::VpsSession;

use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::{AuthUser, PaginationParams};
use crate::state::AppState;

/// GET /api/admin/sessions
pub async fn list_all_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<VpsSession>>>, ApiError> {
    let page = state
        .session_service
        .list_all(&auth, params.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}
