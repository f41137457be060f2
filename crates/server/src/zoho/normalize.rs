//! Coercion of raw Zoho records into typed column values.
//!
//! Zoho returns loosely typed JSON: blank strings for missing numbers,
//! timestamps with `+hhmm` offsets, JSON blobs encoded as strings and
//! booleans where the table stores text. Each field is coerced to the type
//! of its column. A value that cannot be coerced becomes SQL `NULL` (JSON
//! columns become `{}`), is logged at `warn` and is counted.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::{Map, Value};

use kool_data_hub_core::{ColumnType, ColumnValue, ExternalId, ExternalIdError};

use super::resources::ResourceDescriptor;

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+\.?\d*").expect("Invalid regex"));

const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%z",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// A record ready for upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub external_id: ExternalId,
    /// Mapped columns present in the payload, in descriptor order.
    pub values: Vec<(&'static str, ColumnValue)>,
}

impl NormalizedRecord {
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&ColumnValue> {
        self.values
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }
}

/// Result of normalizing one page set.
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub records: Vec<NormalizedRecord>,
    /// Records dropped for lacking a usable external ID.
    pub skipped: usize,
    /// Field values replaced by the null/`{}` default.
    pub coercion_warnings: usize,
}

/// A value that does not fit its column type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionError {
    pub expected: ColumnType,
    pub found: String,
}

impl std::fmt::Display for CoercionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cannot coerce {} to {}", self.found, self.expected)
    }
}

/// Per-resource normalizer.
pub struct RecordNormalizer<'a> {
    resource: &'a ResourceDescriptor,
}

impl<'a> RecordNormalizer<'a> {
    #[must_use]
    pub const fn new(resource: &'a ResourceDescriptor) -> Self {
        Self { resource }
    }

    /// Normalize every raw record, skipping those without an external ID.
    #[must_use]
    pub fn normalize_batch(&self, raw: Vec<Value>) -> NormalizedBatch {
        let mut batch = NormalizedBatch {
            records: Vec::with_capacity(raw.len()),
            ..NormalizedBatch::default()
        };

        for (index, value) in raw.into_iter().enumerate() {
            match self.normalize(&value) {
                Ok((record, warnings)) => {
                    batch.coercion_warnings += warnings;
                    batch.records.push(record);
                }
                Err(e) => {
                    tracing::warn!(
                        resource = self.resource.name,
                        index,
                        id_field = self.resource.id_field,
                        error = %e,
                        "Skipping record without a usable external id"
                    );
                    batch.skipped += 1;
                }
            }
        }

        batch
    }

    /// Normalize one raw record.
    ///
    /// Returns the record and the number of fields that fell back to the
    /// column default. Fields with no column in the descriptor are dropped.
    ///
    /// # Errors
    ///
    /// Returns `ExternalIdError` if the record is not an object or its
    /// external ID is missing, null or blank.
    pub fn normalize(&self, raw: &Value) -> Result<(NormalizedRecord, usize), ExternalIdError> {
        let empty = Map::new();
        let object = match raw {
            Value::Object(map) => map,
            _ => &empty,
        };

        let external_id = ExternalId::from_json(object.get(self.resource.id_field))?;
        let mut warnings = 0;
        let mut values = Vec::with_capacity(object.len().min(self.resource.columns.len()));

        for column in self.resource.columns {
            let Some(raw_value) = object.get(column.name) else {
                continue;
            };
            let value = coerce(raw_value, column.ty).unwrap_or_else(|e| {
                tracing::warn!(
                    resource = self.resource.name,
                    external_id = %external_id,
                    column = column.name,
                    error = %e,
                    "Coercion failed, storing default"
                );
                warnings += 1;
                default_for(column.ty)
            });
            values.push((column.name, value));
        }

        Ok((NormalizedRecord { external_id, values }, warnings))
    }
}

/// Value stored when coercion fails.
#[must_use]
pub fn default_for(ty: ColumnType) -> ColumnValue {
    match ty {
        ColumnType::Json => ColumnValue::Json(Value::Object(Map::new())),
        other => ColumnValue::Null(other),
    }
}

/// Coerce a raw JSON value to `ty`.
///
/// # Errors
///
/// Returns `CoercionError` if the value has no sensible reading as `ty`.
pub fn coerce(raw: &Value, ty: ColumnType) -> Result<ColumnValue, CoercionError> {
    if raw.is_null() {
        return Ok(default_for(ty));
    }
    if let Value::String(s) = raw
        && s.trim().is_empty()
    {
        return Ok(default_for(ty));
    }

    let fail = || CoercionError {
        expected: ty,
        found: describe(raw),
    };

    match ty {
        ColumnType::Text => Ok(ColumnValue::Text(match raw {
            Value::String(s) => s.clone(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            other => other.to_string(),
        })),
        ColumnType::Float => to_f64(raw).map(ColumnValue::Float).ok_or_else(fail),
        ColumnType::Integer => to_f64(raw)
            .and_then(truncate_to_i64)
            .map(ColumnValue::Integer)
            .ok_or_else(fail),
        ColumnType::Boolean => to_bool(raw).map(ColumnValue::Boolean).ok_or_else(fail),
        ColumnType::Timestamp => raw
            .as_str()
            .and_then(parse_timestamp)
            .map(ColumnValue::Timestamp)
            .ok_or_else(fail),
        ColumnType::Date => raw
            .as_str()
            .and_then(parse_date)
            .map(ColumnValue::Date)
            .ok_or_else(fail),
        ColumnType::Json => match raw {
            Value::String(s) => serde_json::from_str(s)
                .map(ColumnValue::Json)
                .map_err(|_| fail()),
            other => Ok(ColumnValue::Json(other.clone())),
        },
    }
}

fn to_f64(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => extract_number(s),
        _ => None,
    }
}

/// First number embedded in `s`: `"Overdue by 34 days"` reads as 34.
#[must_use]
pub fn extract_number(s: &str) -> Option<f64> {
    NUMBER_RE
        .find(s)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

#[allow(clippy::cast_possible_truncation)] // bounds checked above the cast
fn truncate_to_i64(n: f64) -> Option<i64> {
    let t = n.trunc();
    (t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64).then(|| t as i64)
}

fn to_bool(raw: &Value) -> Option<bool> {
    match raw {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Parse a Zoho timestamp, keeping the wall-clock time and dropping any offset.
///
/// Accepts RFC 3339, date-times with a `+0100` style offset (optional
/// fractional seconds, `T` or space separator, minute precision), naive
/// date-times and bare dates (midnight).
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Some(dt.naive_local());
        }
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse a `YYYY-MM-DD` date, or the date part of a timestamp.
#[must_use]
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(s).map(|dt| dt.date()))
}

fn describe(raw: &Value) -> String {
    let text = raw.to_string();
    if text.chars().count() > 64 {
        let head: String = text.chars().take(61).collect();
        format!("{head}...")
    } else {
        text
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::zoho::resources::{INVOICES, ITEMS};

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").unwrap()
    }

    #[test]
    fn test_blank_becomes_null() {
        assert_eq!(
            coerce(&json!("  "), ColumnType::Float),
            Ok(ColumnValue::Null(ColumnType::Float))
        );
        assert_eq!(
            coerce(&json!(""), ColumnType::Text),
            Ok(ColumnValue::Null(ColumnType::Text))
        );
        assert_eq!(
            coerce(&Value::Null, ColumnType::Timestamp),
            Ok(ColumnValue::Null(ColumnType::Timestamp))
        );
    }

    #[test]
    fn test_embedded_number_extraction() {
        assert_eq!(
            coerce(&json!("Overdue by 34 days"), ColumnType::Integer),
            Ok(ColumnValue::Integer(34))
        );
        assert_eq!(
            coerce(&json!("Due in -2.5 days"), ColumnType::Float),
            Ok(ColumnValue::Float(-2.5))
        );
        assert_eq!(
            coerce(&json!(12.9), ColumnType::Integer),
            Ok(ColumnValue::Integer(12))
        );
    }

    #[test]
    fn test_unparseable_number_fails() {
        let err = coerce(&json!("N/A"), ColumnType::Float).unwrap_err();
        assert_eq!(err.expected, ColumnType::Float);
        assert!(coerce(&json!({"amount": 3}), ColumnType::Integer).is_err());
    }

    #[test]
    fn test_booleans_stringified_for_text() {
        assert_eq!(
            coerce(&json!(true), ColumnType::Text),
            Ok(ColumnValue::Text("True".into()))
        );
        assert_eq!(
            coerce(&json!(false), ColumnType::Text),
            Ok(ColumnValue::Text("False".into()))
        );
        assert_eq!(
            coerce(&json!(30), ColumnType::Text),
            Ok(ColumnValue::Text("30".into()))
        );
    }

    #[test]
    fn test_timestamp_offsets_are_dropped() {
        assert_eq!(
            parse_timestamp("2024-05-01T10:20:30+0100"),
            Some(ts("2024-05-01 10:20:30"))
        );
        assert_eq!(
            parse_timestamp("2024-05-01T10:20:30-05:00"),
            Some(ts("2024-05-01 10:20:30"))
        );
        assert_eq!(
            parse_timestamp("2024-05-01 10:20:30"),
            Some(ts("2024-05-01 10:20:30"))
        );
        assert_eq!(
            parse_timestamp("2024-05-01T10:20:30.123+0100"),
            Some(ts("2024-05-01 10:20:30.123"))
        );
        assert_eq!(
            parse_timestamp("2024-05-01 10:20:30+0100"),
            Some(ts("2024-05-01 10:20:30"))
        );
        assert_eq!(
            parse_timestamp("2024-05-01T10:20+0100"),
            Some(ts("2024-05-01 10:20:00"))
        );
        assert_eq!(parse_timestamp("2024-05-01"), Some(ts("2024-05-01 00:00:00")));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_date_from_timestamp() {
        assert_eq!(
            parse_date("2024-05-01T23:59:59+0530"),
            NaiveDate::from_ymd_opt(2024, 5, 1)
        );
        assert_eq!(parse_date("01/05/2024"), None);
    }

    #[test]
    fn test_json_columns() {
        assert_eq!(
            coerce(&json!(r#"{"cf_region":"Lagos"}"#), ColumnType::Json),
            Ok(ColumnValue::Json(json!({"cf_region": "Lagos"})))
        );
        assert_eq!(
            coerce(&json!([{"tag_id": "1"}]), ColumnType::Json),
            Ok(ColumnValue::Json(json!([{"tag_id": "1"}])))
        );
        assert_eq!(
            coerce(&Value::Null, ColumnType::Json),
            Ok(ColumnValue::Json(json!({})))
        );
        assert!(coerce(&json!("not json"), ColumnType::Json).is_err());
        assert_eq!(default_for(ColumnType::Json), ColumnValue::Json(json!({})));
    }

    #[test]
    fn test_normalize_drops_unknown_fields_and_counts_warnings() {
        let raw = json!({
            "item_id": "460000000026049",
            "name": "Kool 200L Solar Freezer",
            "rate": "N/A",
            "is_taxable": true,
            "created_time": "2024-05-01T10:20:30+0100",
            "unknown_field": "dropped",
        });

        let (record, warnings) = RecordNormalizer::new(&ITEMS).normalize(&raw).unwrap();

        assert_eq!(record.external_id.as_str(), "460000000026049");
        assert_eq!(warnings, 1);
        assert_eq!(record.get("rate"), Some(&ColumnValue::Null(ColumnType::Float)));
        assert_eq!(record.get("is_taxable"), Some(&ColumnValue::Boolean(true)));
        assert_eq!(
            record.get("created_time"),
            Some(&ColumnValue::Timestamp(ts("2024-05-01 10:20:30")))
        );
        assert!(record.get("unknown_field").is_none());
        assert!(record.get("item_id").is_none());
        assert_eq!(record.values.len(), 4);
    }

    #[test]
    fn test_normalize_batch_skips_missing_ids() {
        let raw = vec![
            json!({"invoice_id": "1", "total": 100.5, "date": "2024-06-30"}),
            json!({"total": 3}),
            json!({"invoice_id": "", "total": 3}),
            json!("not an object"),
            json!({"invoice_id": 2, "due_days": "Overdue by 34 days"}),
        ];

        let batch = RecordNormalizer::new(&INVOICES).normalize_batch(raw);

        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.skipped, 3);
        assert_eq!(batch.coercion_warnings, 0);
        assert_eq!(
            batch.records[0].get("date"),
            Some(&ColumnValue::Date(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()))
        );
        assert_eq!(batch.records[1].external_id.as_str(), "2");
        assert_eq!(batch.records[1].get("due_days"), Some(&ColumnValue::Integer(34)));
    }
}
