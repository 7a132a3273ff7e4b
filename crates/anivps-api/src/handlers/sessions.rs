//! Session CRUD handlers.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use uuid::Uuid;

use anivps_core::error::AppError;
use anivps_database::SessionFilter;
use anivps_entity::log::SessionLogEntry;
use anivps_entity::session::{NetworkingType, OsType, SessionStatus, VpsSession, VpsTier};
use anivps_service::ProvisionParams;

use crate::dto::request::{CreateSessionRequest, LogQuery, SessionListQuery};
use crate::dto::response::{ApiResponse, MessageResponse};
use crate::dto::validate_body;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/sessions
pub async fn create_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<VpsSession>>), ApiError> {
    validate_body(&req)?;

    let params = ProvisionParams {
        github_token: req.github_token,
        workflow_content: req.workflow_content,
        repo_name: req.repo_name,
        os_type: parse_optional::<OsType>(req.os_type.as_deref())?,
        vps_config: parse_optional::<VpsTier>(req.vps_config.as_deref())?,
        networking_type: parse_optional::<NetworkingType>(req.networking_type.as_deref())?,
    };

    let session = state.controller.create(&auth, params).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(session))))
}

/// GET /api/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<SessionListQuery>,
) -> Result<Json<ApiResponse<Vec<VpsSession>>>, ApiError> {
    let filter = SessionFilter {
        user_id: None,
        is_active: query.is_active,
        status: parse_optional::<SessionStatus>(query.status.as_deref())?,
    };
    let sessions = state.session_service.list(&auth, filter).await?;
    Ok(Json(ApiResponse::ok(sessions)))
}

/// GET /api/sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<VpsSession>>, ApiError> {
    let session = state.session_service.get(&auth, id).await?;
    Ok(Json(ApiResponse::ok(session)))
}

/// DELETE /api/sessions/{id}
pub async fn delete_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.controller.delete(&auth, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Session deleted"))))
}

/// POST /api/sessions/{id}/connect
pub async fn connect_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<VpsSession>>, ApiError> {
    let session = state.controller.record_connection(&auth, id).await?;
    Ok(Json(ApiResponse::ok(session)))
}

/// GET /api/sessions/{id}/logs
pub async fn session_logs(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<LogQuery>,
) -> Result<Json<ApiResponse<Vec<SessionLogEntry>>>, ApiError> {
    let logs = state.session_service.logs(&auth, id, query.limit).await?;
    Ok(Json(ApiResponse::ok(logs)))
}

/// Parse an optional enum field, treating blank as absent.
fn parse_optional<T>(value: Option<&str>) -> Result<Option<T>, AppError>
where
    T: FromStr<Err = AppError>,
{
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.parse().map(Some),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_optional_blank_is_none() {
        assert_eq!(parse_optional::<OsType>(None).unwrap(), None);
        assert_eq!(parse_optional::<OsType>(Some("  ")).unwrap(), None);
        assert_eq!(
            parse_optional::<OsType>(Some("Ubuntu")).unwrap(),
            Some(OsType::Ubuntu)
        );
        assert!(parse_optional::<OsType>(Some("beos")).is_err());
    }
}
