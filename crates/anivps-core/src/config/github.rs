//! GitHub REST client configuration.

use serde::{Deserialize, Serialize};

/// Settings for the outbound CI provider client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Base URL of the REST API (override for GitHub Enterprise).
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Value of the `X-GitHub-Api-Version` header.
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// `User-Agent` sent with every request (GitHub rejects requests without one).
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Upper bound on the size of a downloaded log bundle, in bytes.
    #[serde(default = "default_max_log_bytes")]
    pub max_log_bundle_bytes: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_version: default_api_version(),
            user_agent: default_user_agent(),
            request_timeout_seconds: default_request_timeout(),
            max_log_bundle_bytes: default_max_log_bytes(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_api_version() -> String {
    "2022-11-28".to_string()
}

fn default_user_agent() -> String {
    concat!("anivps/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_log_bytes() -> u64 {
    32 * 1024 * 1024
}
