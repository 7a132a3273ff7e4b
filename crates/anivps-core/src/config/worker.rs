//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Provisioning worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the worker is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Number of sessions advanced concurrently per tick.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Interval in seconds between two scans for due sessions.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Maximum number of due sessions claimed per tick.
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            concurrency: default_concurrency(),
            poll_interval_seconds: default_poll_interval(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    4
}

fn default_poll_interval() -> u64 {
    2
}

fn default_batch_size() -> i64 {
    32
}
