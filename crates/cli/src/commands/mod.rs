//! Subcommand implementations.

pub mod credential;
pub mod migrate;
pub mod refresh;

use order_desk_web::config::{ConfigError, get_database_url};
use order_desk_web::db::{self, RepositoryError};
use order_desk_web::services::SyncError;
use sqlx::PgPool;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Input failed validation.
    #[error("Invalid input: {}", .0.join("; "))]
    Invalid(Vec<String>),

    /// Named record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Connect to the Order Desk database.
async fn connect() -> Result<PgPool, CliError> {
    dotenvy::dotenv().ok();
    let database_url = get_database_url("ORDER_DESK_DATABASE_URL")?;

    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&database_url).await?)
}
