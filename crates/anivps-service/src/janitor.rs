//! Reclamation of defunct sessions.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::info;

use anivps_core::config::JanitorConfig;
use anivps_core::result::AppResult;
use anivps_database::{DeletedSession, SessionStore};

use crate::credentials::CredentialVault;

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub deleted_count: usize,
    pub deleted_sessions: Vec<DeletedSession>,
}

/// Hard-deletes failed, expired and stale pending sessions.
///
/// Repositories on the provider are left in place.
#[derive(Debug, Clone)]
pub struct Janitor {
    sessions: Arc<dyn SessionStore>,
    vault: Arc<CredentialVault>,
    config: JanitorConfig,
}

impl Janitor {
    /// Creates a new janitor.
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        vault: Arc<CredentialVault>,
        config: JanitorConfig,
    ) -> Self {
        Self {
            sessions,
            vault,
            config,
        }
    }

    /// Delete every session that is failed, past `expires_at`, or still
    /// pending after the configured timeout. Safe to repeat.
    pub async fn sweep(&self, now: DateTime<Utc>) -> AppResult<SweepReport> {
        let pending_cutoff = now - Duration::minutes(self.config.pending_timeout_minutes);
        let deleted = self.sessions.delete_defunct(now, pending_cutoff).await?;

        for session in &deleted {
            self.vault.remove(session.id).await;
        }

        if !deleted.is_empty() {
            info!(
                count = deleted.len(),
                repos = ?deleted.iter().map(|d| d.github_repo.as_str()).collect::<Vec<_>>(),
                "Janitor removed defunct sessions"
            );
        }

        Ok(SweepReport {
            deleted_count: deleted.len(),
            deleted_sessions: deleted,
        })
    }
}
