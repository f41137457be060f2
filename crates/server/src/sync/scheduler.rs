//! Cron-driven sync jobs.
//!
//! Each enabled resource gets its own task that sleeps until the next fire
//! time of its schedule (UTC), runs the job and repeats. Jobs for different
//! resources are independent.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinSet;

use super::{SyncError, SyncService, SyncStore};
use crate::config::JobSchedule;
use crate::zoho::resources::{self, ResourceDescriptor};

/// Owns the running job tasks.
pub struct Scheduler {
    tasks: JoinSet<()>,
}

impl Scheduler {
    /// Spawn one task per schedule.
    #[must_use]
    pub fn start<S: SyncStore>(service: Arc<SyncService<S>>, schedules: Vec<JobSchedule>) -> Self {
        for resource in unscheduled(&schedules) {
            tracing::info!(resource = resource.name, "Scheduled sync disabled");
        }

        let mut tasks = JoinSet::new();
        for job in schedules {
            tracing::info!(
                resource = job.resource.name,
                schedule = %job.schedule,
                "Scheduling sync job"
            );
            tasks.spawn(run_job(Arc::clone(&service), job));
        }
        Self { tasks }
    }

    /// Number of live job tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Abort every job and wait for the tasks to finish.
    ///
    /// A job interrupted mid-write rolls back with its transaction.
    pub async fn shutdown(mut self) {
        self.tasks.abort_all();
        while self.tasks.join_next().await.is_some() {}
        tracing::info!("Scheduler stopped");
    }
}

/// Resources with no schedule (set to `off`).
fn unscheduled(schedules: &[JobSchedule]) -> Vec<&'static ResourceDescriptor> {
    resources::ALL
        .iter()
        .copied()
        .filter(|r| !schedules.iter().any(|job| job.resource.name == r.name))
        .collect()
}

async fn run_job<S: SyncStore>(service: Arc<SyncService<S>>, job: JobSchedule) {
    let resource = job.resource;
    loop {
        let Some(next) = job.schedule.upcoming(Utc).next() else {
            tracing::warn!(resource = resource.name, "Schedule has no upcoming fire time");
            return;
        };
        let wait = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        tracing::debug!(resource = resource.name, next = %next, "Next scheduled sync");
        tokio::time::sleep(wait).await;

        match service.run(resource).await {
            Ok(report) => tracing::info!(
                resource = resource.name,
                fetched = report.fetched,
                inserted = report.inserted,
                updated = report.updated,
                "Scheduled sync finished"
            ),
            Err(SyncError::AlreadyRunning(_)) => {
                tracing::warn!(resource = resource.name, "Previous run still in progress, skipping");
            }
            Err(e) => {
                let event_id = sentry::capture_error(&e);
                tracing::error!(
                    resource = resource.name,
                    error = %e,
                    sentry_event_id = %event_id,
                    "Scheduled sync failed"
                );
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::parse_schedule;
    use crate::zoho::resources::{ITEMS, VENDORS};

    fn job(resource: &'static ResourceDescriptor) -> JobSchedule {
        JobSchedule {
            resource,
            schedule: parse_schedule("SYNC_SCHEDULE_TEST", "0 0 12 * * *")
                .unwrap()
                .unwrap(),
        }
    }

    #[test]
    fn test_unscheduled_lists_disabled_resources() {
        let all: Vec<JobSchedule> = resources::ALL.iter().copied().map(job).collect();
        assert!(unscheduled(&all).is_empty());

        let partial = vec![job(&ITEMS), job(&VENDORS)];
        let disabled = unscheduled(&partial);
        assert_eq!(disabled.len(), resources::ALL.len() - 2);
        assert!(disabled.iter().all(|r| r.name != ITEMS.name && r.name != VENDORS.name));
    }
}
