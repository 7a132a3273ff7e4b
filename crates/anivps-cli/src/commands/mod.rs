//! CLI command definitions and dispatch.

pub mod cleanup;
pub mod migrate;
pub mod sessions;
pub mod stats;
pub mod token;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use anivps_api::AppState;
use anivps_core::config::AppConfig;
use anivps_core::error::AppError;
use anivps_database::{DatabasePool, SessionLogStore, SessionStore};
use anivps_github::{GitHubClient, WorkflowDriver};

use crate::output::OutputFormat;

/// AniVPS: VPS console session orchestration
#[derive(Debug, Parser)]
#[command(name = "anivps", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (extension optional)
    #[arg(short, long, default_value = "config/default")]
    pub config: String,

    /// Environment overlay, loaded from `config/{env}.toml`
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Inspect and manage sessions
    Sessions(sessions::SessionsArgs),
    /// Run a janitor sweep now
    Cleanup(cleanup::CleanupArgs),
    /// Usage analytics
    Stats(stats::StatsArgs),
    /// Issue a bearer token for development
    Token(token::TokenArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = AppConfig::load(&self.config, &self.env)?;
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &config, self.format).await,
            Commands::Sessions(args) => sessions::execute(args, &config, self.format).await,
            Commands::Cleanup(args) => cleanup::execute(args, &config, self.format).await,
            Commands::Stats(args) => stats::execute(args, &config, self.format).await,
            Commands::Token(args) => token::execute(args, &config),
        }
    }
}

/// Services wired against the configured database.
pub struct CliContext {
    pub db: DatabasePool,
    pub sessions: Arc<dyn SessionStore>,
    pub state: AppState,
}

impl CliContext {
    /// Connect to the database and wire the same services the server uses.
    pub async fn connect(config: &AppConfig) -> Result<Self, AppError> {
        let db = DatabasePool::connect(&config.database).await?;
        let sessions: Arc<dyn SessionStore> = Arc::new(db.sessions());
        let logs: Arc<dyn SessionLogStore> = Arc::new(db.session_logs());
        let driver: Arc<dyn WorkflowDriver> = Arc::new(GitHubClient::new(&config.github)?);

        let state = AppState::build(
            config.clone(),
            Arc::clone(&sessions),
            logs,
            driver,
            Some(db.clone()),
        );

        Ok(Self {
            db,
            sessions,
            state,
        })
    }
}
