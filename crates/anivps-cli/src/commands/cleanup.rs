//! Manual janitor sweep.

use chrono::Utc;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use anivps_core::config::AppConfig;
use anivps_core::error::AppError;

use super::CliContext;
use crate::output::{self, OutputFormat};

/// Arguments for the cleanup command
#[derive(Debug, Args)]
pub struct CleanupArgs {
    /// Skip confirmation
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Serialize, Tabled)]
struct DeletedRow {
    id: String,
    repository: String,
}

/// Delete failed, expired and stale pending sessions
pub async fn execute(
    args: &CleanupArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    if !output::confirm(
        "Delete every failed, expired and stale pending session?",
        args.force,
    )? {
        println!("Cancelled.");
        return Ok(());
    }

    let ctx = CliContext::connect(config).await?;
    let report = ctx.state.janitor.sweep(Utc::now()).await?;

    match format {
        OutputFormat::Json => output::print_json(&report),
        OutputFormat::Table => {
            let rows: Vec<DeletedRow> = report
                .deleted_sessions
                .iter()
                .map(|d| DeletedRow {
                    id: d.id.to_string(),
                    repository: d.github_repo.clone(),
                })
                .collect();
            output::print_list(&rows, format);
            output::print_success(&format!("Deleted {} sessions", report.deleted_count));
        }
    }

    ctx.db.close().await;
    Ok(())
}
