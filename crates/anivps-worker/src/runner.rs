//! Provisioning runner: the server-side poll loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinSet;
use tokio::time::{self, MissedTickBehavior};

use anivps_core::config::WorkerConfig;
use anivps_core::result::AppResult;
use anivps_database::SessionStore;
use anivps_service::ProvisioningController;

/// Advances sessions in `dispatching` or `polling` whose next step is due.
///
/// Each tick claims one batch, runs it with bounded concurrency and waits
/// for the whole batch before the next scan, so a session is never
/// advanced twice at once.
#[derive(Debug)]
pub struct ProvisioningRunner {
    sessions: Arc<dyn SessionStore>,
    controller: Arc<ProvisioningController>,
    config: WorkerConfig,
    worker_id: String,
}

impl ProvisioningRunner {
    /// Create a new runner.
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        controller: Arc<ProvisioningController>,
        config: WorkerConfig,
        worker_id: String,
    ) -> Self {
        Self {
            sessions,
            controller,
            config,
            worker_id,
        }
    }

    /// Run until the cancel signal flips to `true`.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        tracing::info!(
            worker = %self.worker_id,
            concurrency = self.config.concurrency,
            poll_interval = self.config.poll_interval_seconds,
            batch_size = self.config.batch_size,
            "Provisioning runner started"
        );

        let period = Duration::from_secs(self.config.poll_interval_seconds.max(1));
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        tracing::info!(
                            worker = %self.worker_id,
                            "Provisioning runner received shutdown signal"
                        );
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.tick().await {
                        tracing::error!(
                            worker = %self.worker_id,
                            error = %e,
                            "Failed to load due sessions"
                        );
                    }
                }
            }
        }

        tracing::info!(worker = %self.worker_id, "Provisioning runner shut down complete");
    }

    /// Advance every due session once. Returns how many were advanced.
    pub async fn tick(&self) -> AppResult<usize> {
        let due = self
            .sessions
            .find_due_for_provisioning(Utc::now(), self.config.batch_size.max(1))
            .await?;
        if due.is_empty() {
            tracing::trace!(worker = %self.worker_id, "No sessions due");
            return Ok(0);
        }

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut batch = JoinSet::new();

        for session in due {
            let controller = Arc::clone(&self.controller);
            let semaphore = Arc::clone(&semaphore);
            batch.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let phase = session.phase;
                match controller.advance(session.id).await {
                    Ok(Some(updated)) => tracing::debug!(
                        session_id = %session.id,
                        from = %phase,
                        to = %updated.phase,
                        "Advanced session"
                    ),
                    Ok(None) => {}
                    Err(e) => tracing::error!(
                        session_id = %session.id,
                        phase = %phase,
                        error = %e,
                        "Failed to advance session"
                    ),
                }
            });
        }

        let mut advanced = 0;
        while let Some(joined) = batch.join_next().await {
            match joined {
                Ok(()) => advanced += 1,
                Err(e) => tracing::error!(
                    worker = %self.worker_id,
                    error = %e,
                    "Provisioning task panicked"
                ),
            }
        }
        Ok(advanced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anivps_core::config::{GitHubConfig, ProvisioningConfig};
    use anivps_database::MemoryStore;
    use anivps_entity::session::{CreateVpsSession, ProvisionPhase, SessionStatus};
    use anivps_github::GitHubClient;
    use anivps_service::credentials::CredentialVault;
    use anivps_service::{LogBus, SessionLogger};
    use chrono::Duration as ChronoDuration;

    fn runner(store: Arc<MemoryStore>) -> ProvisioningRunner {
        let driver = Arc::new(GitHubClient::new(&GitHubConfig::default()).unwrap());
        let logger = SessionLogger::new(store.clone(), Arc::new(LogBus::default()));
        let controller = ProvisioningController::new(
            store.clone(),
            logger,
            driver,
            Arc::new(CredentialVault::new()),
            ProvisioningConfig::default(),
        );
        ProvisioningRunner::new(
            store,
            Arc::new(controller),
            WorkerConfig::default(),
            "test-worker".to_string(),
        )
    }

    #[tokio::test]
    async fn test_tick_without_due_sessions_is_noop() {
        let store = Arc::new(MemoryStore::new());
        assert_eq!(runner(store).tick().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_due_session_without_token_is_failed() {
        let store = Arc::new(MemoryStore::new());
        let mut session = store
            .insert(&CreateVpsSession {
                user_id: None,
                github_repo: "vps-orphan".to_string(),
                os_type: None,
                vps_config: None,
                networking_type: None,
                expires_at: Utc::now() + ChronoDuration::hours(6),
            })
            .await
            .unwrap();
        session.github_repo = "octo/vps-orphan".to_string();
        session.set_phase(ProvisionPhase::Dispatching);
        session.next_poll_at = Some(Utc::now() - ChronoDuration::seconds(1));
        store.save(&session).await.unwrap();

        let runner = runner(store.clone());
        assert_eq!(runner.tick().await.unwrap(), 1);

        let stored = store.find_by_id(session.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SessionStatus::Failed);
        assert_eq!(runner.tick().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let store = Arc::new(MemoryStore::new());
        let runner = runner(store);
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move { runner.run(rx).await });
        tx.send(true).unwrap();
        time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
