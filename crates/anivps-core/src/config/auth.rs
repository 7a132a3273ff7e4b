//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Bearer token verification settings.
///
/// Tokens are issued by the external authentication provider and signed
/// with a shared HMAC-SHA256 secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secret used to verify (and, for tooling, sign) JWTs.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Expected `aud` claim. Audience is not checked when unset.
    #[serde(default)]
    pub audience: Option<String>,
    /// Clock skew tolerance in seconds.
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
    /// TTL in minutes for tokens minted by the CLI.
    #[serde(default = "default_issued_ttl")]
    pub issued_token_ttl_minutes: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            audience: None,
            leeway_seconds: default_leeway(),
            issued_token_ttl_minutes: default_issued_ttl(),
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_leeway() -> u64 {
    5
}

fn default_issued_ttl() -> u64 {
    60
}
