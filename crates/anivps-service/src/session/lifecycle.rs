//! Provisioning state machine.
//!
//! ```text
//! provisioning ──repo+upload──▶ dispatching ──dispatch──▶ polling
//! polling ──success, complete credentials──▶ ready
//! polling ──success, placeholders──────────▶ awaiting_callback
//! polling ──failure / attempts exhausted───▶ failed
//! any ──kill──▶ killed
//! ready | failed | killed | awaiting_callback ──start──▶ dispatching
//! ```
//!
//! `create` runs the first leg inline. Everything after it is driven one
//! step at a time by the provisioning worker through [`advance`].
//!
//! Every transition except `kill` is written with
//! [`SessionStore::save_if_phase`] against the phase it was computed from,
//! so a step that spent seconds waiting on the provider cannot overwrite
//! a kill, a callback or a delete that landed in the meantime.
//!
//! [`advance`]: ProvisioningController::advance

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use anivps_auth::RbacEnforcer;
use anivps_core::config::ProvisioningConfig;
use anivps_core::error::AppError;
use anivps_core::result::AppResult;
use anivps_database::SessionStore;
use anivps_entity::log::LogType;
use anivps_entity::session::{
    CreateVpsSession, NetworkingType, OsType, ProvisionPhase, SessionStatus, VpsSession, VpsTier,
};
use anivps_github::{CancelOutcome, WorkflowDriver, WorkflowRun};

use crate::context::RequestContext;
use crate::credentials::{CredentialVault, scrape};

use super::logger::SessionLogger;

/// Runs created slightly before the recorded dispatch time still belong
/// to it (provider and server clocks differ).
const RUN_DISCOVERY_SKEW_SECONDS: i64 = 10;

/// Input of [`ProvisioningController::create`].
#[derive(Clone)]
pub struct ProvisionParams {
    /// Provider token used for every call of this session.
    pub github_token: String,
    /// Workflow definition uploaded to the new repository.
    pub workflow_content: String,
    /// Repository name; generated from the configured prefix when absent.
    pub repo_name: Option<String>,
    pub os_type: Option<OsType>,
    pub vps_config: Option<VpsTier>,
    pub networking_type: Option<NetworkingType>,
}

impl fmt::Debug for ProvisionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisionParams")
            .field("github_token", &"[REDACTED]")
            .field("workflow_bytes", &self.workflow_content.len())
            .field("repo_name", &self.repo_name)
            .field("os_type", &self.os_type)
            .field("vps_config", &self.vps_config)
            .field("networking_type", &self.networking_type)
            .finish()
    }
}

/// What happened to the provider run when a session was killed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RemoteCancel {
    /// The provider accepted the cancellation.
    Confirmed,
    /// The provider refused or could not be reached.
    Rejected { reason: String },
    /// No run id or no token was available.
    Skipped,
}

/// Result of [`ProvisioningController::kill`].
#[derive(Debug, Clone, Serialize)]
pub struct KillOutcome {
    /// The session after the kill was recorded.
    pub session: VpsSession,
    /// Fate of the remote run.
    pub remote_cancel: RemoteCancel,
}

/// Owns every state transition of a session.
#[derive(Debug, Clone)]
pub struct ProvisioningController {
    sessions: Arc<dyn SessionStore>,
    logger: SessionLogger,
    driver: Arc<dyn WorkflowDriver>,
    vault: Arc<CredentialVault>,
    rbac: RbacEnforcer,
    config: ProvisioningConfig,
}

impl ProvisioningController {
    /// Creates a new controller.
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        logger: SessionLogger,
        driver: Arc<dyn WorkflowDriver>,
        vault: Arc<CredentialVault>,
        config: ProvisioningConfig,
    ) -> Self {
        Self {
            sessions,
            logger,
            driver,
            vault,
            rbac: RbacEnforcer::new(),
            config,
        }
    }

    /// Create the repository, upload the workflow and schedule dispatch.
    ///
    /// Input is validated before any provider call. A provider failure
    /// leaves the session `failed` with an error log entry and is returned.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        params: ProvisionParams,
    ) -> AppResult<VpsSession> {
        validate_params(&params)?;

        let repo_name = match params.repo_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.generate_repo_name(),
        };

        let now = Utc::now();
        let mut session = self
            .sessions
            .insert(&CreateVpsSession {
                user_id: Some(ctx.user_id),
                github_repo: repo_name.clone(),
                os_type: params.os_type,
                vps_config: params.vps_config,
                networking_type: params.networking_type,
                expires_at: now + Duration::minutes(self.config.session_ttl_minutes),
            })
            .await?;
        let id = session.id;

        info!(session_id = %id, user_id = %ctx.user_id, repo = %repo_name, "Provisioning session");
        self.logger
            .info(id, format!("Creating repository '{repo_name}'"))
            .await;

        let repo = match self
            .driver
            .create_repository(&params.github_token, &repo_name, self.config.private_repos)
            .await
        {
            Ok(repo) => repo,
            Err(e) => {
                let message = format!("Repository creation failed: {}", e.message);
                self.fail(session, ProvisionPhase::Provisioning, message).await?;
                return Err(e);
            }
        };

        session.github_repo = repo.full_name.clone();
        session.repo_url = Some(repo.html_url.clone());
        session.default_branch = Some(repo.default_branch.clone());
        let mut session = self
            .commit(&session, ProvisionPhase::Provisioning)
            .await?
            .ok_or_else(|| interrupted(id))?;
        self.logger
            .info(id, format!("Repository {} created", repo.full_name))
            .await;

        let path = self.config.workflow_path();
        let commit = match self
            .driver
            .upload_file(
                &params.github_token,
                &repo.owner,
                &repo.name,
                &path,
                &params.workflow_content,
                &self.config.commit_message,
            )
            .await
        {
            Ok(commit) => commit,
            Err(e) => {
                let message = format!("Workflow upload failed: {}", e.message);
                self.fail(session, ProvisionPhase::Provisioning, message).await?;
                return Err(e);
            }
        };
        self.logger
            .log(
                id,
                LogType::Info,
                format!("Workflow uploaded to {}", commit.path),
                Some(json!({ "sha": commit.sha })),
            )
            .await;

        self.vault.store(id, params.github_token).await;

        let delay = seconds(self.config.dispatch_delay_seconds);
        session.set_phase(ProvisionPhase::Dispatching);
        session.next_poll_at = Some(Utc::now() + delay);
        let Some(session) = self.commit(&session, ProvisionPhase::Provisioning).await? else {
            self.vault.remove(id).await;
            return Err(interrupted(id));
        };
        self.logger
            .info(
                id,
                format!(
                    "Workflow dispatch scheduled in {}s",
                    self.config.dispatch_delay_seconds
                ),
            )
            .await;

        Ok(session)
    }

    /// Run one worker step for a session. Returns the updated session, or
    /// `None` when the session is gone or not worker-driven.
    pub async fn advance(&self, session_id: Uuid) -> AppResult<Option<VpsSession>> {
        let Some(session) = self.sessions.find_by_id(session_id).await? else {
            debug!(session_id = %session_id, "Session vanished before its worker step");
            return Ok(None);
        };
        if !session.phase.is_worker_driven() {
            return Ok(None);
        }

        let phase = session.phase;
        let stepped = match self.vault.get(session_id).await {
            None => {
                self.fail(
                    session,
                    phase,
                    "Provider token is no longer available (the server restarted since \
                     provisioning began); start the session again with a token",
                )
                .await?
            }
            Some(token) if phase == ProvisionPhase::Dispatching => {
                self.dispatch(session, &token).await?
            }
            Some(token) => self.poll_once(session, &token).await?,
        };

        match stepped {
            Some(updated) => Ok(Some(updated)),
            None => {
                debug!(session_id = %session_id, from = %phase, "Worker step superseded");
                self.sessions.find_by_id(session_id).await
            }
        }
    }

    async fn dispatch(
        &self,
        mut session: VpsSession,
        token: &str,
    ) -> AppResult<Option<VpsSession>> {
        const FROM: ProvisionPhase = ProvisionPhase::Dispatching;
        let Some((owner, repo)) = session
            .repo_parts()
            .map(|(o, r)| (o.to_string(), r.to_string()))
        else {
            return self
                .fail(session, FROM, "Repository was never created; cannot dispatch")
                .await;
        };
        let git_ref = session
            .default_branch
            .clone()
            .unwrap_or_else(|| "main".to_string());

        if let Err(e) = self
            .driver
            .dispatch_workflow(token, &owner, &repo, &self.config.workflow_file, &git_ref)
            .await
        {
            let message = format!("Workflow dispatch failed: {}", e.message);
            return self.fail(session, FROM, message).await;
        }

        let now = Utc::now();
        session.set_phase(ProvisionPhase::Polling);
        session.dispatched_at = Some(now);
        session.workflow_run_id = None;
        session.poll_attempts = 0;
        session.next_poll_at = Some(now + seconds(self.config.poll_interval_seconds));
        let Some(session) = self.commit(&session, FROM).await? else {
            return Ok(None);
        };

        self.logger
            .info(session.id, format!("Workflow dispatched on '{git_ref}'"))
            .await;
        Ok(Some(session))
    }

    async fn poll_once(
        &self,
        mut session: VpsSession,
        token: &str,
    ) -> AppResult<Option<VpsSession>> {
        const FROM: ProvisionPhase = ProvisionPhase::Polling;
        let Some((owner, repo)) = session
            .repo_parts()
            .map(|(o, r)| (o.to_string(), r.to_string()))
        else {
            return self
                .fail(session, FROM, "Repository was never created; cannot poll")
                .await;
        };

        session.poll_attempts = session.poll_attempts.saturating_add(1);
        let attempt = session.poll_attempts;
        let max_attempts = i32::try_from(self.config.max_poll_attempts).unwrap_or(i32::MAX);
        let id = session.id;

        match self.driver.list_runs(token, &owner, &repo).await {
            Err(e) => {
                self.logger
                    .warning(
                        id,
                        format!(
                            "Poll {attempt}/{max_attempts}: could not list runs: {}",
                            e.message
                        ),
                    )
                    .await;
            }
            Ok(runs) => match select_run(&session, &runs) {
                None => {
                    self.logger
                        .info(
                            id,
                            format!("Poll {attempt}/{max_attempts}: waiting for the workflow run"),
                        )
                        .await;
                }
                Some(run) => {
                    session.workflow_run_id = Some(run.id);
                    self.logger
                        .log(
                            id,
                            LogType::Info,
                            format!(
                                "Poll {attempt}/{max_attempts}: run {} is {} ({})",
                                run.id,
                                run.status_label(),
                                run.conclusion_label()
                            ),
                            run.html_url.as_ref().map(|url| json!({ "run_url": url })),
                        )
                        .await;

                    if run.is_success() {
                        return self.complete(session, token, &owner, &repo, run.id).await;
                    }
                    if run.is_completed() {
                        let message = format!(
                            "Workflow run {} finished with conclusion '{}'",
                            run.id,
                            run.conclusion_label()
                        );
                        return self.fail(session, FROM, message).await;
                    }
                }
            },
        }

        if attempt >= max_attempts {
            let message = format!(
                "Timed out after {attempt} polls waiting for the workflow run to complete"
            );
            return self.fail(session, FROM, message).await;
        }

        session.next_poll_at = Some(Utc::now() + seconds(self.config.poll_interval_seconds));
        self.commit(&session, FROM).await
    }

    async fn complete(
        &self,
        mut session: VpsSession,
        token: &str,
        owner: &str,
        repo: &str,
        run_id: i64,
    ) -> AppResult<Option<VpsSession>> {
        const FROM: ProvisionPhase = ProvisionPhase::Polling;
        let id = session.id;
        let log_text = match self
            .driver
            .download_run_logs(token, owner, repo, run_id)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                self.logger
                    .warning(id, format!("Could not download run logs: {}", e.message))
                    .await;
                String::new()
            }
        };

        let scraped = scrape(&log_text);
        session.next_poll_at = None;
        session.console_url = scraped.console_url.extracted().map(str::to_string);

        if scraped.is_complete() {
            session.rdp_address = scraped.address.extracted().map(str::to_string);
            session.rdp_username = scraped.username.extracted().map(str::to_string);
            session.rdp_password = scraped.password.extracted().map(str::to_string);
            session.started_at = Some(Utc::now());
            session.set_phase(ProvisionPhase::Ready);
            let Some(session) = self.commit(&session, FROM).await? else {
                return Ok(None);
            };

            info!(session_id = %id, run_id, "Session ready");
            self.logger
                .success(
                    id,
                    format!(
                        "Session ready at {}",
                        session.rdp_address.as_deref().unwrap_or_default()
                    ),
                )
                .await;
            return Ok(Some(session));
        }

        let missing = scraped.missing_fields();
        session.set_phase(ProvisionPhase::AwaitingCallback);
        let Some(session) = self.commit(&session, FROM).await? else {
            return Ok(None);
        };

        warn!(
            session_id = %id,
            run_id,
            missing = ?missing,
            "Run finished without full credentials"
        );
        self.logger
            .log(
                id,
                LogType::Warning,
                format!(
                    "Run completed but {} could not be read from its logs; \
                     waiting for the RDP info callback",
                    missing.join(", ")
                ),
                Some(json!({
                    "missing": missing,
                    "address": scraped.address.display(),
                    "username": scraped.username.display(),
                })),
            )
            .await;
        Ok(Some(session))
    }

    /// Mark a session killed, cancelling its run on a best-effort basis.
    ///
    /// `run_id` and `token` override the stored run and the vault token.
    /// The kill is recorded whatever the provider answers.
    pub async fn kill(
        &self,
        ctx: &RequestContext,
        session_id: Uuid,
        run_id: Option<i64>,
        token: Option<String>,
    ) -> AppResult<KillOutcome> {
        let mut session = self.load_authorized(ctx, session_id).await?;

        let token = match token.filter(|t| !t.trim().is_empty()) {
            Some(token) => Some(token),
            None => self.vault.get(session_id).await,
        };
        let run_id = run_id.or(session.workflow_run_id);

        let remote_cancel = match (token, run_id, session.repo_parts()) {
            (Some(token), Some(run_id), Some((owner, repo))) => {
                match self.driver.cancel_run(&token, owner, repo, run_id).await {
                    CancelOutcome::Confirmed => RemoteCancel::Confirmed,
                    CancelOutcome::Rejected(reason) => RemoteCancel::Rejected { reason },
                }
            }
            _ => RemoteCancel::Skipped,
        };

        let now = Utc::now();
        accumulate_uptime(&mut session, now);
        session.set_phase(ProvisionPhase::Killed);
        session.is_active = false;
        session.next_poll_at = None;
        let session = self.sessions.save(&session).await?;
        self.vault.remove(session_id).await;

        let message = match &remote_cancel {
            RemoteCancel::Confirmed => "Session killed; workflow run cancelled".to_string(),
            RemoteCancel::Rejected { reason } => {
                format!("Session killed; run cancellation was not accepted: {reason}")
            }
            RemoteCancel::Skipped => "Session killed; no workflow run to cancel".to_string(),
        };
        self.logger.warning(session_id, message).await;
        info!(
            session_id = %session_id,
            by = %ctx.user_id,
            remote_cancel = ?remote_cancel,
            "Session killed"
        );

        Ok(KillOutcome {
            session,
            remote_cancel,
        })
    }

    /// Re-dispatch the workflow of an existing repository with a fresh TTL.
    pub async fn start(
        &self,
        ctx: &RequestContext,
        session_id: Uuid,
        token: &str,
    ) -> AppResult<VpsSession> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::validation(
                "A GitHub token is required to start a session",
            ));
        }

        let mut session = self.load_authorized(ctx, session_id).await?;
        if !session.phase.can_restart() {
            return Err(AppError::conflict(format!(
                "Session is still {}; wait for provisioning to finish",
                session.phase
            )));
        }
        if session.repo_parts().is_none() {
            return Err(AppError::conflict(
                "Session has no provisioned repository to restart",
            ));
        }

        let from = session.phase;
        let now = Utc::now();
        accumulate_uptime(&mut session, now);
        session.set_phase(ProvisionPhase::Dispatching);
        session.is_active = true;
        session.workflow_run_id = None;
        session.poll_attempts = 0;
        session.dispatched_at = None;
        session.started_at = None;
        session.clear_credentials();
        session.expires_at = now + Duration::minutes(self.config.session_ttl_minutes);
        session.provisioning_started_at = now;
        session.next_poll_at = Some(now);

        self.vault.store(session_id, token).await;
        let Some(session) = self.commit(&session, from).await? else {
            self.vault.remove(session_id).await;
            return Err(interrupted(session_id));
        };

        info!(session_id = %session_id, by = %ctx.user_id, "Session restart requested");
        self.logger
            .info(session_id, "Session restart requested; re-dispatching workflow")
            .await;
        Ok(session)
    }

    /// Record credentials reported by the running workflow itself.
    ///
    /// `repo` may be `owner/name` or the bare repository name.
    pub async fn record_rdp_info(
        &self,
        repo: &str,
        address: &str,
        username: &str,
        password: &str,
    ) -> AppResult<VpsSession> {
        let (repo, address, username, password) =
            (repo.trim(), address.trim(), username.trim(), password.trim());
        if [repo, address, username, password].iter().any(|v| v.is_empty()) {
            return Err(AppError::validation(
                "Repository name, address, username and password are all required",
            ));
        }

        let mut session = self
            .sessions
            .find_by_repo(repo)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("No session found for repository '{repo}'"))
            })?;
        if session.status == SessionStatus::Killed {
            return Err(AppError::conflict(format!(
                "Session for repository '{repo}' was killed"
            )));
        }

        let from = session.phase;
        let id = session.id;
        session.rdp_address = Some(address.to_string());
        session.rdp_username = Some(username.to_string());
        session.rdp_password = Some(password.to_string());
        if session.started_at.is_none() {
            session.started_at = Some(Utc::now());
        }
        session.next_poll_at = None;
        session.set_phase(ProvisionPhase::Ready);
        let session = self
            .commit(&session, from)
            .await?
            .ok_or_else(|| interrupted(id))?;

        info!(session_id = %session.id, repo = %session.github_repo, "RDP info recorded");
        self.logger
            .success(session.id, format!("RDP connection info received: {address}"))
            .await;
        Ok(session)
    }

    /// Count a client (re)connect on a connected session.
    pub async fn record_connection(
        &self,
        ctx: &RequestContext,
        session_id: Uuid,
    ) -> AppResult<VpsSession> {
        let mut session = self.load_authorized(ctx, session_id).await?;
        if session.status != SessionStatus::Connected {
            return Err(AppError::conflict(format!(
                "Session is {}, not connected",
                session.status
            )));
        }

        let from = session.phase;
        session.connection_count = session.connection_count.saturating_add(1);
        let session = self
            .commit(&session, from)
            .await?
            .ok_or_else(|| interrupted(session_id))?;
        self.logger
            .info(
                session_id,
                format!("Client connected (connection #{})", session.connection_count),
            )
            .await;
        Ok(session)
    }

    /// Hard-delete a session and its log trail.
    pub async fn delete(&self, ctx: &RequestContext, session_id: Uuid) -> AppResult<()> {
        let session = self.load_authorized(ctx, session_id).await?;
        self.vault.remove(session_id).await;
        self.sessions.delete(session.id).await?;
        info!(
            session_id = %session_id,
            repo = %session.github_repo,
            by = %ctx.user_id,
            "Session deleted"
        );
        Ok(())
    }

    async fn load_authorized(
        &self,
        ctx: &RequestContext,
        session_id: Uuid,
    ) -> AppResult<VpsSession> {
        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Session {session_id} not found")))?;
        self.rbac
            .require_owner_or_admin(ctx.user_id, &ctx.role, session.user_id)?;
        Ok(session)
    }

    /// Write `session` unless its stored phase is no longer `from`.
    async fn commit(
        &self,
        session: &VpsSession,
        from: ProvisionPhase,
    ) -> AppResult<Option<VpsSession>> {
        self.sessions.save_if_phase(session, from).await
    }

    /// Move a session to `failed`, log `message` and drop its token.
    ///
    /// Returns `None` without logging when the session left `from` first.
    async fn fail(
        &self,
        mut session: VpsSession,
        from: ProvisionPhase,
        message: impl Into<String>,
    ) -> AppResult<Option<VpsSession>> {
        let message = message.into();
        session.set_phase(ProvisionPhase::Failed);
        session.is_active = false;
        session.next_poll_at = None;
        let Some(session) = self.commit(&session, from).await? else {
            return Ok(None);
        };
        self.vault.remove(session.id).await;

        warn!(
            session_id = %session.id,
            repo = %session.github_repo,
            reason = %message,
            "Provisioning failed"
        );
        self.logger.error(session.id, message).await;
        Ok(Some(session))
    }

    fn generate_repo_name(&self) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{}-{}", self.config.repo_prefix, &suffix[..8])
    }
}

fn interrupted(session_id: Uuid) -> AppError {
    AppError::conflict(format!(
        "Session {session_id} was killed, deleted or updated concurrently; retry"
    ))
}

fn validate_params(params: &ProvisionParams) -> AppResult<()> {
    if params.github_token.trim().is_empty() {
        return Err(AppError::validation("A GitHub token is required"));
    }
    if params.workflow_content.trim().is_empty() {
        return Err(AppError::validation("Workflow content must not be empty"));
    }
    match params.repo_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() && !is_valid_repo_name(name) => {
            Err(AppError::validation(format!(
                "Invalid repository name '{name}': use letters, digits, '.', '-' or '_'"
            )))
        }
        _ => Ok(()),
    }
}

fn is_valid_repo_name(name: &str) -> bool {
    name.len() <= 100
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

/// The tracked run, or the newest run created since the last dispatch.
fn select_run(session: &VpsSession, runs: &[WorkflowRun]) -> Option<WorkflowRun> {
    match session.workflow_run_id {
        Some(tracked) => runs.iter().find(|run| run.id == tracked),
        None => {
            let since: Option<DateTime<Utc>> = session
                .dispatched_at
                .map(|at| at - Duration::seconds(RUN_DISCOVERY_SKEW_SECONDS));
            runs.iter()
                .find(|run| since.is_none_or(|since| run.created_at >= since))
        }
    }
    .cloned()
}

fn accumulate_uptime(session: &mut VpsSession, now: DateTime<Utc>) {
    if session.status == SessionStatus::Connected {
        session.total_uptime_minutes = session
            .total_uptime_minutes
            .saturating_add(session.uptime_minutes_at(now));
    }
}

fn seconds(secs: u64) -> Duration {
    Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX / 1000))
}
