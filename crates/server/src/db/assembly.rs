//! Generic repository for assembly-line tables.
//!
//! One implementation serves every [`AssemblyResource`]. Table and column
//! names come from compile-time constants, never from request input; all
//! values are bound.

use std::marker::PhantomData;

use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};

use kool_data_hub_core::RecordUid;

use super::RepositoryError;
use crate::models::{AssemblyResource, FieldValue};

/// Repository for one assembly table.
pub struct AssemblyRepository<'a, R> {
    pool: &'a PgPool,
    _resource: PhantomData<fn() -> R>,
}

impl<'a, R: AssemblyResource> AssemblyRepository<'a, R> {
    /// Create a new repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            _resource: PhantomData,
        }
    }

    /// List all records, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<R::Record>, RepositoryError> {
        let sql = format!("SELECT * FROM {} ORDER BY created_at DESC", R::TABLE);
        let records = sqlx::query_as::<_, R::Record>(&sql)
            .fetch_all(self.pool)
            .await?;
        Ok(records)
    }

    /// Get a record by its uid.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, uid: RecordUid) -> Result<Option<R::Record>, RepositoryError> {
        let sql = format!("SELECT * FROM {} WHERE uid = $1", R::TABLE);
        let record = sqlx::query_as::<_, R::Record>(&sql)
            .bind(uid)
            .fetch_optional(self.pool)
            .await?;
        Ok(record)
    }

    /// Get the newest record with the given serial number.
    ///
    /// Always `None` for tables without a serial column.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_serial(&self, serial: &str) -> Result<Option<R::Record>, RepositoryError> {
        let Some(column) = R::SERIAL_COLUMN else {
            return Ok(None);
        };
        let sql = format!(
            "SELECT * FROM {} WHERE {column} = $1 ORDER BY created_at DESC LIMIT 1",
            R::TABLE
        );
        let record = sqlx::query_as::<_, R::Record>(&sql)
            .bind(serial)
            .fetch_optional(self.pool)
            .await?;
        Ok(record)
    }

    /// Insert a new record with a fresh uid.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: R::Create) -> Result<R::Record, RepositoryError> {
        let uid = RecordUid::generate();
        let now = Utc::now();
        let values = R::create_values(input, now);

        let mut qb = QueryBuilder::<Postgres>::new(format!("INSERT INTO {} (uid", R::TABLE));
        for (column, _) in &values {
            qb.push(", ").push(*column);
        }
        qb.push(", created_at, updated_at) VALUES (").push_bind(uid);
        for (_, value) in values {
            qb.push(", ");
            push_field(&mut qb, value);
        }
        qb.push(", ")
            .push_bind(now)
            .push(", ")
            .push_bind(now)
            .push(") RETURNING *");

        let record = qb.build_query_as::<R::Record>().fetch_one(self.pool).await?;
        Ok(record)
    }

    /// Apply a partial update and bump `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no record has this uid.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(&self, uid: RecordUid, input: R::Update) -> Result<R::Record, RepositoryError> {
        let values = R::update_values(input);

        let mut qb = QueryBuilder::<Postgres>::new(format!("UPDATE {} SET updated_at = ", R::TABLE));
        qb.push_bind(Utc::now());
        for (column, value) in values {
            qb.push(", ").push(column).push(" = ");
            push_field(&mut qb, value);
        }
        qb.push(" WHERE uid = ").push_bind(uid).push(" RETURNING *");

        qb.build_query_as::<R::Record>()
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Delete a record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no record has this uid.
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, uid: RecordUid) -> Result<(), RepositoryError> {
        let sql = format!("DELETE FROM {} WHERE uid = $1", R::TABLE);
        let result = sqlx::query(&sql).bind(uid).execute(self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

fn push_field(qb: &mut QueryBuilder<'_, Postgres>, value: FieldValue) {
    match value {
        FieldValue::Text(v) => qb.push_bind(v),
        FieldValue::Float(v) => qb.push_bind(v),
        FieldValue::Timestamp(v) => qb.push_bind(v),
    };
}
