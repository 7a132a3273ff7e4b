//! Session inspection and management commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use anivps_core::config::AppConfig;
use anivps_core::error::AppError;
use anivps_database::SessionFilter;
use anivps_entity::log::SessionLogEntry;
use anivps_entity::session::{SessionStatus, VpsSession};
use anivps_service::{RemoteCancel, RequestContext};

use super::CliContext;
use crate::output::{self, OutputFormat};

/// Arguments for session commands
#[derive(Debug, Args)]
pub struct SessionsArgs {
    /// Session subcommand
    #[command(subcommand)]
    pub command: SessionsCommand,
}

/// Session subcommands
#[derive(Debug, Subcommand)]
pub enum SessionsCommand {
    /// List sessions, newest first
    List {
        /// Only sessions of this owner
        #[arg(long)]
        user: Option<Uuid>,
        /// `pending`, `connected`, `failed` or `killed`
        #[arg(long)]
        status: Option<String>,
        /// Only active (not killed) sessions
        #[arg(long)]
        active: bool,
    },
    /// Show one session with its recent log trail
    Show {
        /// Session ID
        id: Uuid,
        /// Log entries to print
        #[arg(long, default_value_t = 20)]
        logs: i64,
    },
    /// Kill a session, cancelling its workflow run when possible
    Kill {
        /// Session ID
        id: Uuid,
        /// Provider token used to cancel the run
        #[arg(long)]
        github_token: Option<String>,
        /// Run to cancel instead of the tracked one
        #[arg(long)]
        run_id: Option<i64>,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
    /// Delete a session and its logs
    Delete {
        /// Session ID
        id: Uuid,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
}

/// Session display row
#[derive(Debug, Serialize, Tabled)]
struct SessionRow {
    id: String,
    owner: String,
    repository: String,
    status: String,
    phase: String,
    active: String,
    created: String,
    expires: String,
}

impl From<&VpsSession> for SessionRow {
    fn from(s: &VpsSession) -> Self {
        Self {
            id: output::short_id(&s.id),
            owner: s
                .user_id
                .as_ref()
                .map(output::short_id)
                .unwrap_or_else(|| "-".to_string()),
            repository: s.github_repo.clone(),
            status: s.status.to_string(),
            phase: s.phase.to_string(),
            active: if s.is_active { "✓" } else { "✗" }.to_string(),
            created: s.created_at.format("%Y-%m-%d %H:%M").to_string(),
            expires: s.expires_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
struct LogRow {
    time: String,
    #[tabled(rename = "type")]
    log_type: String,
    message: String,
}

impl From<&SessionLogEntry> for LogRow {
    fn from(entry: &SessionLogEntry) -> Self {
        Self {
            time: entry.created_at.format("%H:%M:%S").to_string(),
            log_type: entry.log_type.to_string(),
            message: entry.message.clone(),
        }
    }
}

/// Execute session commands
pub async fn execute(
    args: &SessionsArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let ctx = CliContext::connect(config).await?;
    let operator = RequestContext::system();

    match &args.command {
        SessionsCommand::List {
            user,
            status,
            active,
        } => {
            let filter = SessionFilter {
                user_id: *user,
                is_active: active.then_some(true),
                status: status
                    .as_deref()
                    .map(str::parse::<SessionStatus>)
                    .transpose()?,
            };
            let sessions = ctx.sessions.find_by_filter(&filter).await?;
            match format {
                OutputFormat::Json => output::print_json(&sessions),
                OutputFormat::Table => {
                    let rows: Vec<SessionRow> = sessions.iter().map(SessionRow::from).collect();
                    output::print_list(&rows, format);
                }
            }
        }
        SessionsCommand::Show { id, logs } => {
            let session = ctx.state.session_service.get(&operator, *id).await?;
            let entries = ctx
                .state
                .session_service
                .logs(&operator, *id, Some(*logs))
                .await?;

            match format {
                OutputFormat::Json => output::print_json(&serde_json::json!({
                    "session": session,
                    "logs": entries,
                })),
                OutputFormat::Table => {
                    print_session(&session);
                    println!();
                    let rows: Vec<LogRow> = entries.iter().map(LogRow::from).collect();
                    output::print_list(&rows, format);
                }
            }
        }
        SessionsCommand::Kill {
            id,
            github_token,
            run_id,
            force,
        } => {
            if !output::confirm(&format!("Kill session {id}?"), *force)? {
                println!("Cancelled.");
                return Ok(());
            }
            let outcome = ctx
                .state
                .controller
                .kill(&operator, *id, *run_id, github_token.clone())
                .await?;

            match &outcome.remote_cancel {
                RemoteCancel::Confirmed => output::print_success("Workflow run cancelled"),
                RemoteCancel::Rejected { reason } => {
                    output::print_warning(&format!("Run cancellation was not accepted: {reason}"))
                }
                RemoteCancel::Skipped => {
                    output::print_warning("No run id or token available; run left alone")
                }
            }
            output::print_success(&format!("Session {id} killed"));
        }
        SessionsCommand::Delete { id, force } => {
            if !output::confirm(&format!("Delete session {id} and its logs?"), *force)? {
                println!("Cancelled.");
                return Ok(());
            }
            ctx.state.controller.delete(&operator, *id).await?;
            output::print_success(&format!("Session {id} deleted"));
        }
    }

    ctx.db.close().await;
    Ok(())
}

fn print_session(s: &VpsSession) {
    let none = || "-".to_string();
    output::print_kv("ID", &s.id.to_string());
    output::print_kv(
        "Owner",
        &s.user_id.map(|u| u.to_string()).unwrap_or_else(none),
    );
    output::print_kv("Repository", &s.github_repo);
    output::print_kv("Status", &format!("{} ({})", s.status, s.phase));
    output::print_kv("Active", &s.is_active.to_string());
    output::print_kv(
        "OS",
        &s.os_type.map(|o| o.to_string()).unwrap_or_else(none),
    );
    output::print_kv(
        "Tier",
        &s.vps_config
            .map(|t| {
                let hw = t.spec();
                format!(
                    "{t} ({} vCPU, {} GB RAM, {} GB disk)",
                    hw.vcpus, hw.ram_gb, hw.disk_gb
                )
            })
            .unwrap_or_else(none),
    );
    output::print_kv(
        "Networking",
        &s.networking_type.map(|n| n.to_string()).unwrap_or_else(none),
    );
    output::print_kv(
        "Workflow run",
        &s.workflow_run_id.map(|r| r.to_string()).unwrap_or_else(none),
    );
    output::print_kv(
        "Address",
        s.rdp_address.as_deref().unwrap_or("-"),
    );
    output::print_kv(
        "Credentials",
        if s.has_credentials() { "recorded" } else { "none" },
    );
    output::print_kv("Created", &s.created_at.to_rfc3339());
    output::print_kv("Expires", &s.expires_at.to_rfc3339());
    output::print_kv("Uptime (min)", &s.total_uptime_minutes.to_string());
    output::print_kv("Connections", &s.connection_count.to_string());
}
