//! Database migration management commands.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use anivps_core::config::AppConfig;
use anivps_core::error::AppError;
use anivps_database::DatabasePool;
use anivps_database::migration::{migration_status, run_migrations};

use crate::output::{self, OutputFormat};

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Show which migrations are applied instead of running them
    #[arg(long)]
    pub status: bool,
}

#[derive(Debug, Serialize, Tabled)]
struct MigrationRow {
    version: i64,
    description: String,
    applied: String,
}

/// Execute migration commands
pub async fn execute(
    args: &MigrateArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let db = DatabasePool::connect(&config.database).await?;

    if args.status {
        let rows: Vec<MigrationRow> = migration_status(db.pool())
            .await?
            .into_iter()
            .map(|m| MigrationRow {
                version: m.version,
                description: m.description,
                applied: if m.applied { "✓" } else { "✗" }.to_string(),
            })
            .collect();
        output::print_list(&rows, format);
    } else {
        println!("Running database migrations...");
        run_migrations(db.pool()).await?;
        output::print_success("All migrations applied successfully.");
    }

    db.close().await;
    Ok(())
}
