//! Janitor and callback configuration.

use serde::{Deserialize, Serialize};

/// Defunct-session sweep configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JanitorConfig {
    /// Whether the sweep runs on a schedule inside the server.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron expression (with seconds) for the scheduled sweep.
    #[serde(default = "default_schedule")]
    pub schedule: String,
    /// Shared key expected in `x-api-key` on the cleanup endpoint.
    /// The endpoint refuses every request when unset.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Sessions still pending after this many minutes are swept.
    #[serde(default = "default_pending_timeout")]
    pub pending_timeout_minutes: i64,
}

impl Default for JanitorConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            schedule: default_schedule(),
            api_key: None,
            pending_timeout_minutes: default_pending_timeout(),
        }
    }
}

/// Configuration of the RDP-info callback posted by running workflows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallbackConfig {
    /// Shared secret expected in `x-callback-key`. Unchecked when unset.
    #[serde(default)]
    pub secret: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_schedule() -> String {
    "0 */10 * * * *".to_string()
}

fn default_pending_timeout() -> i64 {
    30
}
