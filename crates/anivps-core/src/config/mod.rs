//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod app;
pub mod auth;
pub mod database;
pub mod github;
pub mod janitor;
pub mod logging;
pub mod provisioning;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::auth::AuthConfig;
pub use self::database::DatabaseConfig;
pub use self::github::GitHubConfig;
pub use self::janitor::{CallbackConfig, JanitorConfig};
pub use self::logging::LoggingConfig;
pub use self::provisioning::ProvisioningConfig;
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Environment variable prefix, e.g. `ANIVPS__DATABASE__URL`.
const ENV_PREFIX: &str = "ANIVPS";

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Bearer token verification settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// GitHub REST client settings.
    #[serde(default)]
    pub github: GitHubConfig,
    /// Provisioning sequence settings.
    #[serde(default)]
    pub provisioning: ProvisioningConfig,
    /// Defunct-session sweep settings.
    #[serde(default)]
    pub janitor: JanitorConfig,
    /// RDP-info callback settings.
    #[serde(default)]
    pub callback: CallbackConfig,
    /// Background provisioning worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the base file at `path` with an optional `config/{env}.toml`
    /// overlay and environment variables prefixed with `ANIVPS__`.
    pub fn load(path: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let parsed: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        parsed.validate()?;
        Ok(parsed)
    }

    /// Reject configurations that would make the service unusable.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(AppError::configuration("auth.jwt_secret must not be empty"));
        }
        if self.provisioning.max_poll_attempts == 0 {
            return Err(AppError::configuration(
                "provisioning.max_poll_attempts must be at least 1",
            ));
        }
        if self.worker.concurrency == 0 {
            return Err(AppError::configuration(
                "worker.concurrency must be at least 1",
            ));
        }
        Ok(())
    }
}
