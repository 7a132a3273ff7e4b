//! Embedded schema migrations.

use serde::Serialize;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

use anivps_core::error::{AppError, ErrorKind};

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// A migration known to the binary and whether the database has it.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationState {
    /// Migration version (file prefix).
    pub version: i64,
    /// Human-readable description.
    pub description: String,
    /// Whether the migration has been applied.
    pub applied: bool,
}

/// Apply every pending migration.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    info!(
        embedded = MIGRATOR.iter().count(),
        "Running database migrations"
    );

    MIGRATOR.run(pool).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Database,
            format!("Failed to run migrations: {e}"),
            e,
        )
    })?;

    info!("Database migrations completed");
    Ok(())
}

/// Compare embedded migrations against the `_sqlx_migrations` ledger.
pub async fn migration_status(pool: &PgPool) -> Result<Vec<MigrationState>, AppError> {
    let applied: Vec<i64> = sqlx::query_scalar(
        "SELECT version FROM _sqlx_migrations WHERE success = TRUE ORDER BY version",
    )
    .fetch_all(pool)
    .await
    .unwrap_or_default();

    Ok(MIGRATOR
        .iter()
        .map(|m| MigrationState {
            version: m.version,
            description: m.description.to_string(),
            applied: applied.contains(&m.version),
        })
        .collect())
}
