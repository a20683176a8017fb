//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! es-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `STORE_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! `crates/server/migrations/`, applied in filename order.

use thiserror::Error;

use super::{CommandError, connect};

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run the store database migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let pool = connect().await?;

    tracing::info!("Running store migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Store migrations complete!");
    Ok(())
}
