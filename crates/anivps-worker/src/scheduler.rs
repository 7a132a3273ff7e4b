//! Cron scheduler for the janitor sweep.

use std::sync::Arc;

use chrono::Utc;
use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use anivps_core::error::AppError;
use anivps_service::Janitor;

/// Cron-based scheduler for periodic background tasks.
pub struct CronScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler.
    pub async fn new() -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self { scheduler })
    }

    /// Run `janitor.sweep` on `schedule` (cron with seconds).
    pub async fn register_janitor(
        &self,
        janitor: Arc<Janitor>,
        schedule: &str,
    ) -> Result<(), AppError> {
        let job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let janitor = Arc::clone(&janitor);
            Box::pin(async move {
                tracing::debug!("Running scheduled janitor sweep");
                match janitor.sweep(Utc::now()).await {
                    Ok(report) if report.deleted_count > 0 => {
                        tracing::info!(
                            deleted = report.deleted_count,
                            "Scheduled janitor sweep finished"
                        );
                    }
                    Ok(_) => {}
                    Err(e) => tracing::error!(error = %e, "Scheduled janitor sweep failed"),
                }
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid janitor schedule '{schedule}': {e}"))
        })?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add janitor schedule: {e}")))?;

        tracing::info!(schedule, "Registered: janitor sweep");
        Ok(())
    }

    /// Start the scheduler.
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler.
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anivps_core::config::JanitorConfig;
    use anivps_database::MemoryStore;
    use anivps_service::credentials::CredentialVault;

    fn janitor() -> Arc<Janitor> {
        Arc::new(Janitor::new(
            Arc::new(MemoryStore::new()),
            Arc::new(CredentialVault::new()),
            JanitorConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_register_default_schedule() {
        let scheduler = CronScheduler::new().await.unwrap();
        scheduler
            .register_janitor(janitor(), &JanitorConfig::default().schedule)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_invalid_schedule_is_configuration_error() {
        let scheduler = CronScheduler::new().await.unwrap();
        let err = scheduler
            .register_janitor(janitor(), "every ten minutes")
            .await
            .unwrap_err();
        assert_eq!(err.kind, anivps_core::error::ErrorKind::Configuration);
    }
}
