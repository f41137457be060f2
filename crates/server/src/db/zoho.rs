//! Synced Zoho tables: upsert writer and read queries.
//!
//! Each synced table's primary key is the resource's external ID column.
//! Every table also carries `synced_at`, set on each insert or update.

use serde_json::Value;
use sqlx::{Connection, PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use kool_data_hub_core::{ColumnType, ColumnValue};

use super::RepositoryError;
use crate::sync::{CommitMode, SyncError, SyncStore, WriteOutcome};
use crate::zoho::normalize::NormalizedRecord;
use crate::zoho::resources::ResourceDescriptor;

/// `PostgreSQL` implementation of [`SyncStore`].
#[derive(Clone)]
pub struct PgSyncStore {
    pool: PgPool,
}

impl PgSyncStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn write(
        &self,
        resource: &'static ResourceDescriptor,
        records: &[NormalizedRecord],
        mode: CommitMode,
    ) -> Result<WriteOutcome, RepositoryError> {
        let mut outcome = WriteOutcome::default();
        let mut tx = self.pool.begin().await?;

        for record in records {
            match mode {
                CommitMode::Strict => {
                    match upsert_record(&mut tx, resource, record).await {
                        Ok(inserted) => outcome.count(inserted),
                        Err(e) => {
                            tracing::error!(
                                external_id = %record.external_id,
                                error = %e,
                                "Upsert failed, rolling back batch"
                            );
                            tx.rollback().await?;
                            return Err(e.into());
                        }
                    }
                }
                CommitMode::BestEffort => {
                    let mut savepoint = Connection::begin(&mut *tx).await?;
                    match upsert_record(&mut savepoint, resource, record).await {
                        Ok(inserted) => {
                            savepoint.commit().await?;
                            outcome.count(inserted);
                        }
                        Err(e) => {
                            savepoint.rollback().await?;
                            tracing::warn!(
                                external_id = %record.external_id,
                                error = %e,
                                "Upsert failed, record rolled back"
                            );
                            outcome.failed += 1;
                        }
                    }
                }
            }
        }

        tx.commit().await?;
        Ok(outcome)
    }
}

impl SyncStore for PgSyncStore {
    #[instrument(skip_all, fields(resource = resource.name, records = records.len(), mode = %mode))]
    async fn upsert_batch(
        &self,
        resource: &'static ResourceDescriptor,
        records: &[NormalizedRecord],
        mode: CommitMode,
    ) -> Result<WriteOutcome, SyncError> {
        Ok(self.write(resource, records, mode).await?)
    }
}

impl WriteOutcome {
    const fn count(&mut self, inserted: bool) {
        if inserted {
            self.inserted += 1;
        } else {
            self.updated += 1;
        }
    }
}

/// Insert or overwrite one record. Returns `true` if the row is new.
///
/// Only the columns present in the record are written, so fields absent
/// from the Zoho payload keep their stored values.
async fn upsert_record(
    conn: &mut PgConnection,
    resource: &ResourceDescriptor,
    record: &NormalizedRecord,
) -> Result<bool, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "INSERT INTO {} ({}",
        resource.table, resource.id_field
    ));
    for (column, _) in &record.values {
        qb.push(", ").push(*column);
    }
    qb.push(", synced_at) VALUES (")
        .push_bind(record.external_id.as_str().to_owned());
    for (_, value) in &record.values {
        qb.push(", ");
        push_column_value(&mut qb, value);
    }
    qb.push(", now()) ON CONFLICT (")
        .push(resource.id_field)
        .push(") DO UPDATE SET ");
    for (column, _) in &record.values {
        qb.push(*column).push(" = EXCLUDED.").push(*column).push(", ");
    }
    qb.push("synced_at = EXCLUDED.synced_at RETURNING (xmax = 0) AS inserted");

    qb.build_query_scalar::<bool>().fetch_one(conn).await
}

fn push_column_value(qb: &mut QueryBuilder<'_, Postgres>, value: &ColumnValue) {
    match value.clone() {
        ColumnValue::Null(ty) => match ty {
            ColumnType::Text => qb.push_bind(None::<String>),
            ColumnType::Float => qb.push_bind(None::<f64>),
            ColumnType::Integer => qb.push_bind(None::<i64>),
            ColumnType::Boolean => qb.push_bind(None::<bool>),
            ColumnType::Timestamp => qb.push_bind(None::<chrono::NaiveDateTime>),
            ColumnType::Date => qb.push_bind(None::<chrono::NaiveDate>),
            ColumnType::Json => qb.push_bind(None::<Value>),
        },
        ColumnValue::Text(v) => qb.push_bind(v),
        ColumnValue::Float(v) => qb.push_bind(v),
        ColumnValue::Integer(v) => qb.push_bind(v),
        ColumnValue::Boolean(v) => qb.push_bind(v),
        ColumnValue::Timestamp(v) => qb.push_bind(v),
        ColumnValue::Date(v) => qb.push_bind(v),
        ColumnValue::Json(v) => qb.push_bind(v),
    };
}

/// Read access to synced rows, returned as JSON objects.
pub struct SyncedRecordRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SyncedRecordRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List rows, most recently synced first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        resource: &ResourceDescriptor,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Value>, RepositoryError> {
        let sql = format!(
            "SELECT to_jsonb(t) FROM {table} t ORDER BY t.synced_at DESC, t.{id} LIMIT $1 OFFSET $2",
            table = resource.table,
            id = resource.id_field,
        );
        let rows = sqlx::query_scalar::<_, Value>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Get one row by external ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        resource: &ResourceDescriptor,
        external_id: &str,
    ) -> Result<Option<Value>, RepositoryError> {
        let sql = format!(
            "SELECT to_jsonb(t) FROM {table} t WHERE t.{id} = $1",
            table = resource.table,
            id = resource.id_field,
        );
        let row = sqlx::query_scalar::<_, Value>(&sql)
            .bind(external_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Number of rows in the table.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, resource: &ResourceDescriptor) -> Result<i64, RepositoryError> {
        let sql = format!("SELECT count(*) FROM {}", resource.table);
        let count = sqlx::query_scalar::<_, i64>(&sql).fetch_one(self.pool).await?;
        Ok(count)
    }
}
