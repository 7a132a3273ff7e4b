//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use anivps_database::DeletedSession;
use anivps_database::connection::PoolStats;
use anivps_entity::session::SessionStatus;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `GET /api/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// `GET /api/health/detailed`.
#[derive(Debug, Clone, Serialize)]
pub struct DetailedHealthResponse {
    pub status: String,
    /// `connected`, `unreachable` or `in-memory`.
    pub database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolStats>,
    /// Sessions whose provider token is held by this process.
    pub held_tokens: usize,
    /// Sessions with an open live-log channel.
    pub log_channels: usize,
}

/// `POST /api/cleanup-sessions`.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupResponse {
    pub success: bool,
    pub deleted_count: usize,
    pub deleted_sessions: Vec<DeletedSession>,
}

/// `POST /api/update-rdp-info`. Credentials are not echoed back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RdpInfoResponse {
    pub session_id: Uuid,
    pub github_repo: String,
    pub status: SessionStatus,
    pub started_at: Option<DateTime<Utc>>,
}
