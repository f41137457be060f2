//! Fetch, normalize and upsert one Zoho resource.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use crate::db::{PgSyncStore, RepositoryError};
use crate::zoho::normalize::{NormalizedRecord, RecordNormalizer};
use crate::zoho::resources::{self, ResourceDescriptor};
use crate::zoho::{ZohoClient, ZohoError};

/// How a batch write is committed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// One transaction; any failed record rolls back the batch.
    #[default]
    Strict,
    /// One transaction with a savepoint per record; failed records are skipped.
    BestEffort,
}

impl FromStr for CommitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "best_effort" | "best-effort" => Ok(Self::BestEffort),
            other => Err(format!("unknown commit mode '{other}' (expected strict or best_effort)")),
        }
    }
}

impl fmt::Display for CommitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => f.write_str("strict"),
            Self::BestEffort => f.write_str("best_effort"),
        }
    }
}

/// Errors that abort a sync job.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Zoho(#[from] ZohoError),

    #[error("write failed: {0}")]
    Repository(#[from] RepositoryError),

    #[error("sync for '{0}' is already running")]
    AlreadyRunning(String),

    #[error("unknown resource '{0}'")]
    UnknownResource(String),
}

impl SyncError {
    /// Whether a whole-job retry may help.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Zoho(e) if e.is_retryable())
    }
}

/// Counts returned by a store after writing a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    pub inserted: usize,
    pub updated: usize,
    pub failed: usize,
}

/// Summary of one completed sync job.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub resource: &'static str,
    pub commit_mode: CommitMode,
    /// Raw records returned by Zoho.
    pub fetched: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Records without a usable external ID.
    pub skipped: usize,
    /// Records rolled back in best-effort mode.
    pub failed: usize,
    /// Field values replaced by the null/`{}` default.
    pub coercion_warnings: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Destination of normalized records.
///
/// [`PgSyncStore`] is the production implementation.
pub trait SyncStore: Send + Sync + 'static {
    /// Upsert `records` keyed by external ID, committing per `mode`.
    fn upsert_batch(
        &self,
        resource: &'static ResourceDescriptor,
        records: &[NormalizedRecord],
        mode: CommitMode,
    ) -> impl Future<Output = Result<WriteOutcome, SyncError>> + Send;
}

/// Runs sync jobs; at most one run per resource at a time.
pub struct SyncService<S = PgSyncStore> {
    zoho: ZohoClient,
    store: S,
    commit_mode: CommitMode,
    running: Mutex<HashSet<&'static str>>,
}

impl<S: SyncStore> SyncService<S> {
    #[must_use]
    pub fn new(zoho: ZohoClient, store: S, commit_mode: CommitMode) -> Self {
        Self {
            zoho,
            store,
            commit_mode,
            running: Mutex::new(HashSet::new()),
        }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Whether a run of `resource` is in progress.
    #[must_use]
    pub fn is_running(&self, resource: &str) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(resource)
    }

    /// Run a sync job by resource name.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::UnknownResource` for names not in the descriptor
    /// table, otherwise see [`Self::run`].
    pub async fn run_by_name(&self, name: &str) -> Result<SyncReport, SyncError> {
        let resource =
            resources::by_name(name).ok_or_else(|| SyncError::UnknownResource(name.to_string()))?;
        self.run(resource).await
    }

    /// Run one sync job: token, fetch, normalize, upsert.
    ///
    /// Resources with a job retry policy rerun the whole job on connect or
    /// timeout failures.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::AlreadyRunning` if the resource is being synced,
    /// `SyncError::Zoho` if the token exchange or fetch fails, and
    /// `SyncError::Repository` if the write is rolled back.
    #[instrument(skip_all, fields(resource = resource.name))]
    pub async fn run(&self, resource: &'static ResourceDescriptor) -> Result<SyncReport, SyncError> {
        let _guard = RunGuard::acquire(&self.running, resource.name)?;

        let attempts = resource.job_retry.attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.run_once(resource).await {
                Err(e) if e.is_retryable() && attempt < attempts => {
                    tracing::warn!(error = %e, attempt, attempts, "Sync job failed, retrying");
                    tokio::time::sleep(resource.job_retry.delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn run_once(&self, resource: &'static ResourceDescriptor) -> Result<SyncReport, SyncError> {
        let started_at = Utc::now();

        let token = self.zoho.access_token().await?;
        let raw = self.zoho.fetch_all(resource, &token).await?;
        let fetched = raw.len();

        let batch = RecordNormalizer::new(resource).normalize_batch(raw);
        let outcome = self
            .store
            .upsert_batch(resource, &batch.records, self.commit_mode)
            .await?;

        let report = SyncReport {
            resource: resource.name,
            commit_mode: self.commit_mode,
            fetched,
            inserted: outcome.inserted,
            updated: outcome.updated,
            skipped: batch.skipped,
            failed: outcome.failed,
            coercion_warnings: batch.coercion_warnings,
            started_at,
            finished_at: Utc::now(),
        };

        tracing::info!(
            fetched = report.fetched,
            inserted = report.inserted,
            updated = report.updated,
            skipped = report.skipped,
            failed = report.failed,
            coercion_warnings = report.coercion_warnings,
            "Sync committed"
        );

        Ok(report)
    }
}

/// Marks a resource as running until dropped.
struct RunGuard<'a> {
    running: &'a Mutex<HashSet<&'static str>>,
    name: &'static str,
}

impl<'a> RunGuard<'a> {
    fn acquire(running: &'a Mutex<HashSet<&'static str>>, name: &'static str) -> Result<Self, SyncError> {
        let mut set = running.lock().unwrap_or_else(PoisonError::into_inner);
        if !set.insert(name) {
            return Err(SyncError::AlreadyRunning(name.to_string()));
        }
        Ok(Self { running, name })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(self.name);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_mode_parse() {
        assert_eq!("strict".parse::<CommitMode>(), Ok(CommitMode::Strict));
        assert_eq!(" Best_Effort ".parse::<CommitMode>(), Ok(CommitMode::BestEffort));
        assert!("sometimes".parse::<CommitMode>().is_err());
        assert_eq!(CommitMode::default(), CommitMode::Strict);
        assert_eq!(CommitMode::BestEffort.to_string(), "best_effort");
    }

    #[test]
    fn test_run_guard_rejects_second_run() {
        let running = Mutex::new(HashSet::new());

        let guard = RunGuard::acquire(&running, "items").unwrap();
        assert!(matches!(
            RunGuard::acquire(&running, "items"),
            Err(SyncError::AlreadyRunning(name)) if name == "items"
        ));
        // Other resources are independent.
        let other = RunGuard::acquire(&running, "vendors").unwrap();

        drop(guard);
        assert!(RunGuard::acquire(&running, "items").is_ok());
        drop(other);
        assert!(running.lock().unwrap().is_empty());
    }

    #[test]
    fn test_only_transport_errors_are_retryable() {
        assert!(!SyncError::AlreadyRunning("items".into()).is_retryable());
        assert!(!SyncError::Repository(RepositoryError::NotFound).is_retryable());
        assert!(!SyncError::Zoho(ZohoError::AuthenticationFailed("x".into())).is_retryable());
    }
}
