//! Usage analytics handler.

use axum::Json;
use axum::extract::{Query, State};

use anivps_service::SessionAnalytics;

use crate::dto::request::AnalyticsQuery;
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/analytics
pub async fn analytics(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<ApiResponse<SessionAnalytics>>, ApiError> {
    let report = state
        .session_service
        .analytics(&auth, query.tz_offset_minutes)
        .await?;
    Ok(Json(ApiResponse::ok(report)))
}
