//! Zoho-to-PostgreSQL sync.
//!
//! [`SyncService`] runs the pipeline for one resource on demand (HTTP route,
//! CLI); [`Scheduler`] runs it on each resource's cron schedule.

pub mod pipeline;
pub mod scheduler;

pub use pipeline::{
    CommitMode, SyncError, SyncReport, SyncService, SyncStore, WriteOutcome,
};
pub use scheduler::Scheduler;
