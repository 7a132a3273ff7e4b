//! Append-only diagnostic trail of a session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Severity of a session log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "session_log_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    Info,
    Warning,
    Error,
    Success,
}

impl LogType {
    /// Return the log type as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Success => "success",
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable log line attached to a session.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionLogEntry {
    /// Unique entry identifier.
    pub id: Uuid,
    /// Owning session.
    pub session_id: Uuid,
    /// Severity.
    pub log_type: LogType,
    /// Free-text message.
    pub message: String,
    /// Optional structured context.
    pub metadata: Option<serde_json::Value>,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
}

/// Data required to append a log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionLog {
    /// Owning session.
    pub session_id: Uuid,
    /// Severity.
    pub log_type: LogType,
    /// Free-text message.
    pub message: String,
    /// Optional structured context.
    pub metadata: Option<serde_json::Value>,
}

impl CreateSessionLog {
    /// Build an entry without metadata.
    pub fn new(session_id: Uuid, log_type: LogType, message: impl Into<String>) -> Self {
        Self {
            session_id,
            log_type,
            message: message.into(),
            metadata: None,
        }
    }

    /// Attach structured metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
