//! Database migration command.
//!
//! Applies `crates/marketplace/migrations/`, including the session table used
//! by the API's cookie sessions. The API never migrates on start-up.

use super::{CommandError, connect};

/// Apply all pending marketplace migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails or a
/// migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running marketplace migrations...");
    sqlx::migrate!("../marketplace/migrations").run(&pool).await?;

    tracing::info!("Marketplace migrations complete!");
    Ok(())
}
