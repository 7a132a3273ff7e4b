//! Best-effort writer of the per-session diagnostic trail.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use anivps_database::SessionLogStore;
use anivps_entity::log::{CreateSessionLog, LogType};

use super::log_bus::LogBus;

/// Appends log entries and forwards them to live subscribers.
///
/// A failed append is reported through `tracing` and otherwise ignored:
/// the state transition that produced the message has already happened.
#[derive(Debug, Clone)]
pub struct SessionLogger {
    store: Arc<dyn SessionLogStore>,
    bus: Arc<LogBus>,
}

impl SessionLogger {
    /// Creates a new logger.
    pub fn new(store: Arc<dyn SessionLogStore>, bus: Arc<LogBus>) -> Self {
        Self { store, bus }
    }

    /// The bus entries are published to.
    pub fn bus(&self) -> &Arc<LogBus> {
        &self.bus
    }

    pub async fn info(&self, session_id: Uuid, message: impl Into<String>) {
        self.log(session_id, LogType::Info, message, None).await;
    }

    pub async fn warning(&self, session_id: Uuid, message: impl Into<String>) {
        self.log(session_id, LogType::Warning, message, None).await;
    }

    pub async fn error(&self, session_id: Uuid, message: impl Into<String>) {
        self.log(session_id, LogType::Error, message, None).await;
    }

    pub async fn success(&self, session_id: Uuid, message: impl Into<String>) {
        self.log(session_id, LogType::Success, message, None).await;
    }

    /// Append one entry with optional structured metadata.
    pub async fn log(
        &self,
        session_id: Uuid,
        log_type: LogType,
        message: impl Into<String>,
        metadata: Option<Value>,
    ) {
        let mut data = CreateSessionLog::new(session_id, log_type, message);
        if let Some(metadata) = metadata {
            data = data.with_metadata(metadata);
        }

        match self.store.append(&data).await {
            Ok(entry) => self.bus.publish(entry).await,
            Err(e) => warn!(
                session_id = %session_id,
                log_type = %log_type,
                error = %e,
                "Failed to append session log entry"
            ),
        }
    }
}
