//! Database operations for Kool Data Hub `PostgreSQL`.
//!
//! # Schemas
//!
//! - `zoho_nigeria_inventory` - items, composite items, price lists, inventory adjustments
//! - `zoho_nigeria_sales` - customers, invoices, packages, picklists, sales orders
//! - `zoho_nigeria_purchases` - purchase orders, vendors
//! - `kool_assembly` - locally managed assembly-line records and user accounts
//!
//! Synced tables are keyed by the Zoho external ID and written only by the
//! sync pipeline. Assembly tables are keyed by a generated `uid`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p kool-data-hub-cli -- migrate
//! ```

pub mod assembly;
pub mod users;
pub mod zoho;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use assembly::AssemblyRepository;
pub use users::UserRepository;
pub use zoho::{PgSyncStore, SyncedRecordRepository};

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

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
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
