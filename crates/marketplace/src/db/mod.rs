//! Database operations for the marketplace `PostgreSQL`.
//!
//! The hosted backend exposes a regular Postgres endpoint; all reads and
//! writes go through it with runtime-checked `sqlx` queries.
//!
//! ## Tables
//!
//! - `profiles` - One row per auth-provider user (role, contact fields)
//! - `suppliers` - Business details for supplier profiles
//! - `categories` / `products` - Catalog
//! - `cart_items` - One row per (user, product)
//! - `orders` / `order_items` - Placed orders and their price snapshots
//! - `verifications` / `verification_documents` - Supplier review workflow
//! - `notification_preferences` - Per-user notification switches
//! - `tower_sessions.session` - Cookie session storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/marketplace/migrations/` and run via:
//! ```bash
//! cargo run -p medsupply-cli -- migrate
//! ```

pub mod cart;
pub mod catalog;
pub mod notifications;
pub mod orders;
pub mod profiles;
pub mod stats;
pub mod suppliers;
pub mod verifications;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use cart::CartRepository;
pub use catalog::CatalogRepository;
pub use notifications::NotificationRepository;
pub use orders::OrderRepository;
pub use profiles::ProfileRepository;
pub use stats::StatsRepository;
pub use suppliers::SupplierRepository;
pub use verifications::VerificationRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation or state conflict (e.g., duplicate order number).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to `Conflict`, leaving other errors as-is.
    pub(crate) fn on_unique_violation(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Escape `LIKE` metacharacters and wrap the term for a substring match.
///
/// NUL characters are dropped; Postgres text cannot hold them.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars().filter(|&c| c != '\0') {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
