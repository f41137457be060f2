//! One-shot Zoho sync commands.
//!
//! # Usage
//!
//! ```bash
//! # Sync one resource
//! kdh-cli sync sales_orders
//!
//! # Sync every resource in order, continuing past failures
//! kdh-cli sync all --mode best-effort
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `ZOHO_CLIENT_ID`, `ZOHO_CLIENT_SECRET`, `ZOHO_REFRESH_TOKEN`,
//!   `ZOHO_ORGANIZATION_ID` - Zoho OAuth credentials

use kool_data_hub_server::config::{ConfigError, ZohoConfig};
use kool_data_hub_server::db::{self, PgSyncStore};
use kool_data_hub_server::sync::{CommitMode, SyncError, SyncReport, SyncService};
use kool_data_hub_server::zoho::{ZohoClient, ZohoError, resources};
use thiserror::Error;

/// Errors that can occur during a one-shot sync.
#[derive(Debug, Error)]
pub enum SyncCommandError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Zoho client error: {0}")]
    Zoho(#[from] ZohoError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("{0} of {1} sync jobs failed")]
    Partial(usize, usize),
}

/// Sync `target` (a resource name or `all`) and print each report as JSON.
///
/// # Errors
///
/// Returns the job's `SyncError` for a single resource, or
/// `SyncCommandError::Partial` if any job of `all` failed.
pub async fn run(target: &str, mode: CommitMode) -> Result<(), SyncCommandError> {
    let database_url =
        super::database_url().ok_or(SyncCommandError::MissingEnvVar("DATABASE_URL"))?;
    let zoho = ZohoClient::new(ZohoConfig::from_env()?)?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;
    let service = SyncService::new(zoho, PgSyncStore::new(pool), mode);

    if target != "all" {
        let report = service.run_by_name(target).await?;
        print_report(&report);
        return Ok(());
    }

    let mut failed = 0;
    for resource in resources::ALL {
        match service.run(resource).await {
            Ok(report) => print_report(&report),
            Err(e) => {
                failed += 1;
                tracing::error!(resource = resource.name, error = %e, "Sync job failed");
            }
        }
    }

    if failed > 0 {
        return Err(SyncCommandError::Partial(failed, resources::ALL.len()));
    }
    Ok(())
}

fn print_report(report: &SyncReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => {
            #[allow(clippy::print_stdout)]
            {
                println!("{json}");
            }
        }
        Err(e) => tracing::warn!(error = %e, "Could not serialize sync report"),
    }
}
