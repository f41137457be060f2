//! Typed column values for synced tables.
//!
//! Synced records arrive as loosely typed JSON and are coerced into one of a
//! small set of column types before being written. A null keeps its column
//! type so the database layer can bind a correctly typed `NULL`.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Storage type of a synced column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// `text`
    Text,
    /// `double precision`
    Float,
    /// `bigint`
    Integer,
    /// `boolean`
    Boolean,
    /// `timestamp` (without time zone)
    Timestamp,
    /// `date`
    Date,
    /// `jsonb`
    Json,
}

impl ColumnType {
    /// The `PostgreSQL` type name used in migrations.
    #[must_use]
    pub const fn pg_type(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Float => "double precision",
            Self::Integer => "bigint",
            Self::Boolean => "boolean",
            Self::Timestamp => "timestamp",
            Self::Date => "date",
            Self::Json => "jsonb",
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.pg_type())
    }
}

/// A coerced value ready to be bound into an upsert.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    /// SQL `NULL` of the given column type.
    Null(ColumnType),
    Text(String),
    Float(f64),
    Integer(i64),
    Boolean(bool),
    Timestamp(NaiveDateTime),
    Date(NaiveDate),
    Json(serde_json::Value),
}

impl ColumnValue {
    /// The column type this value binds as.
    #[must_use]
    pub const fn column_type(&self) -> ColumnType {
        match self {
            Self::Null(ty) => *ty,
            Self::Text(_) => ColumnType::Text,
            Self::Float(_) => ColumnType::Float,
            Self::Integer(_) => ColumnType::Integer,
            Self::Boolean(_) => ColumnType::Boolean,
            Self::Timestamp(_) => ColumnType::Timestamp,
            Self::Date(_) => ColumnType::Date,
            Self::Json(_) => ColumnType::Json,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null(_))
    }

    /// Returns the text content, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_keeps_type() {
        let value = ColumnValue::Null(ColumnType::Timestamp);
        assert!(value.is_null());
        assert_eq!(value.column_type(), ColumnType::Timestamp);
    }

    #[test]
    fn test_pg_type_names() {
        assert_eq!(ColumnType::Float.pg_type(), "double precision");
        assert_eq!(ColumnType::Json.to_string(), "jsonb");
    }

    #[test]
    fn test_as_text() {
        assert_eq!(ColumnValue::Text("Paid".into()).as_text(), Some("Paid"));
        assert_eq!(ColumnValue::Integer(3).as_text(), None);
    }
}
