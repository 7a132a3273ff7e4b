//! JWT signing for operator tooling and tests.
//!
//! Production tokens come from the authentication provider; the encoder
//! mints compatible ones from the shared secret.

use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use anivps_core::config::AuthConfig;
use anivps_core::error::AppError;
use anivps_entity::user::UserRole;

use super::claims::Claims;

/// Creates signed HS256 access tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    encoding_key: EncodingKey,
    ttl_minutes: i64,
    audience: Option<String>,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("ttl_minutes", &self.ttl_minutes)
            .field("audience", &self.audience)
            .finish()
    }
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl_minutes: config.issued_token_ttl_minutes as i64,
            audience: config.audience.clone(),
        }
    }

    /// Override the token lifetime.
    pub fn with_ttl_minutes(mut self, ttl_minutes: i64) -> Self {
        self.ttl_minutes = ttl_minutes;
        self
    }

    /// Sign an access token for `user_id` with `role`.
    pub fn issue(
        &self,
        user_id: Uuid,
        role: UserRole,
        email: Option<&str>,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = now + chrono::Duration::minutes(self.ttl_minutes);

        let claims = Claims {
            sub: user_id,
            email: email.map(str::to_string),
            app_role: role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            aud: self.audience.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode access token: {e}")))
    }
}
