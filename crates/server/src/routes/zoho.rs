//! Read access to synced Zoho tables and on-demand sync.
//!
//! ```text
//! GET  /                          - Resources with their tables and run state
//! GET  /{resource}                - Page through synced rows
//! GET  /{resource}/{external_id}  - One synced row
//! POST /{resource}/sync           - Run a sync job now
//! ```

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::SyncedRecordRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAccessToken;
use crate::sync::{SyncError, SyncReport};
use crate::state::AppState;
use crate::zoho::resources::{self, ResourceDescriptor};

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;

/// Create the Zoho router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_resources))
        .route("/{resource}", get(list_records))
        .route("/{resource}/sync", post(trigger_sync))
        .route("/{resource}/{external_id}", get(show_record))
}

#[derive(Debug, Serialize)]
struct ResourceSummary {
    name: &'static str,
    endpoint: &'static str,
    table: &'static str,
    running: bool,
}

/// Pagination query for synced rows.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    limit: Option<i64>,
    offset: Option<i64>,
}

impl ListQuery {
    fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[derive(Debug, Serialize)]
struct RecordPage {
    resource: &'static str,
    total: i64,
    limit: i64,
    offset: i64,
    records: Vec<Value>,
}

fn lookup(name: &str) -> Result<&'static ResourceDescriptor> {
    resources::by_name(name).ok_or_else(|| SyncError::UnknownResource(name.to_string()).into())
}

async fn list_resources(
    _auth: RequireAccessToken,
    State(state): State<AppState>,
) -> Json<Vec<ResourceSummary>> {
    let sync = state.sync();
    let summaries = resources::ALL
        .iter()
        .map(|r| ResourceSummary {
            name: r.name,
            endpoint: r.endpoint,
            table: r.table,
            running: sync.is_running(r.name),
        })
        .collect();
    Json(summaries)
}

async fn list_records(
    _auth: RequireAccessToken,
    State(state): State<AppState>,
    resource: std::result::Result<Path<String>, PathRejection>,
    query: std::result::Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<RecordPage>> {
    let Path(name) = resource?;
    let Query(query) = query?;
    let resource = lookup(&name)?;

    let repo = SyncedRecordRepository::new(state.pool());
    let (limit, offset) = (query.limit(), query.offset());
    let total = repo.count(resource).await?;
    let records = repo.list(resource, limit, offset).await?;

    Ok(Json(RecordPage {
        resource: resource.name,
        total,
        limit,
        offset,
        records,
    }))
}

async fn show_record(
    _auth: RequireAccessToken,
    State(state): State<AppState>,
    path: std::result::Result<Path<(String, String)>, PathRejection>,
) -> Result<Json<Value>> {
    let Path((name, external_id)) = path?;
    let resource = lookup(&name)?;

    SyncedRecordRepository::new(state.pool())
        .get(resource, &external_id)
        .await?
        .map(Json)
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "{} record '{external_id}' not found",
                resource.name
            ))
        })
}

async fn trigger_sync(
    _auth: RequireAccessToken,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<SyncReport>> {
    let report = state.sync().run_by_name(&name).await?;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_defaults_and_bounds() {
        let q = ListQuery {
            limit: None,
            offset: None,
        };
        assert_eq!(q.limit(), DEFAULT_LIMIT);
        assert_eq!(q.offset(), 0);

        let q = ListQuery {
            limit: Some(50_000),
            offset: Some(-3),
        };
        assert_eq!(q.limit(), MAX_LIMIT);
        assert_eq!(q.offset(), 0);

        let q = ListQuery {
            limit: Some(0),
            offset: Some(20),
        };
        assert_eq!(q.limit(), 1);
        assert_eq!(q.offset(), 20);
    }

    #[test]
    fn test_lookup_unknown_resource() {
        let err = lookup("widgets").unwrap_err();
        assert!(matches!(
            err,
            AppError::Sync(SyncError::UnknownResource(ref n)) if n == "widgets"
        ));
        assert!(lookup("sales_orders").is_ok());
    }
}
