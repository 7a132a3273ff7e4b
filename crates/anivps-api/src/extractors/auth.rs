//! `AuthUser` extractor: pulls the JWT from the Authorization header,
//! validates it, and injects the caller context.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use anivps_auth::JwtDecoder;
use anivps_core::error::AppError;
use anivps_service::RequestContext;

use crate::error::ApiError;
use crate::state::AppState;

/// Extracted authenticated user context available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub RequestContext);

impl AuthUser {
    /// Returns the inner `RequestContext`.
    pub fn context(&self) -> &RequestContext {
        &self.0
    }
}

impl std::ops::Deref for AuthUser {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Verify `token` and build the caller context from its claims.
pub fn authenticate(decoder: &JwtDecoder, token: &str) -> Result<RequestContext, AppError> {
    let claims = decoder.decode_access_token(token)?;
    Ok(RequestContext::new(
        claims.user_id(),
        claims.app_role,
        claims.email,
    ))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::authentication("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::authentication("Invalid Authorization header format"))?;

        let ctx = authenticate(&state.jwt_decoder, token)?;
        Ok(AuthUser(ctx))
    }
}
