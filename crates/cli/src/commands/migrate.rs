//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! od-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `ORDER_DESK_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! Migrations live in `crates/web/migrations/` and are embedded at build time.

use order_desk_web::db;

use super::{CliError, connect};

/// Run the Order Desk migrations.
///
/// # Errors
///
/// Returns `CliError` if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    db::run_migrations(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
