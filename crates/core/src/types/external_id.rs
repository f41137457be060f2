//! Vendor-assigned external record IDs.

use core::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Errors that can occur when reading an [`ExternalId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ExternalIdError {
    /// The field was absent or null.
    #[error("external id is missing")]
    Missing,
    /// The field was present but blank.
    #[error("external id is blank")]
    Blank,
    /// The field held a type that cannot name a record (object, array, bool).
    #[error("external id has unsupported JSON type: {0}")]
    UnsupportedType(&'static str),
}

/// The upstream system's identifier for a record, used as the upsert key.
///
/// Zoho returns IDs as JSON strings, but a few endpoints emit them as
/// numbers; both are accepted and stored as text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ExternalId(String);

impl ExternalId {
    /// Build an ID from a string, rejecting blanks.
    ///
    /// # Errors
    ///
    /// Returns `ExternalIdError::Blank` if the string is empty after trimming.
    pub fn parse(s: &str) -> Result<Self, ExternalIdError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ExternalIdError::Blank);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Read an ID out of a raw JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error for missing, null, blank or non-scalar values.
    pub fn from_json(value: Option<&Value>) -> Result<Self, ExternalIdError> {
        match value {
            None | Some(Value::Null) => Err(ExternalIdError::Missing),
            Some(Value::String(s)) => Self::parse(s),
            Some(Value::Number(n)) => Ok(Self(n.to_string())),
            Some(Value::Bool(_)) => Err(ExternalIdError::UnsupportedType("bool")),
            Some(Value::Array(_)) => Err(ExternalIdError::UnsupportedType("array")),
            Some(Value::Object(_)) => Err(ExternalIdError::UnsupportedType("object")),
        }
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ExternalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_from_json_string_and_number() {
        let id = ExternalId::from_json(Some(&json!(" 460000000026049 "))).unwrap();
        assert_eq!(id.as_str(), "460000000026049");

        let id = ExternalId::from_json(Some(&json!(460_000_000_026_049_u64))).unwrap();
        assert_eq!(id.as_str(), "460000000026049");
    }

    #[test]
    fn test_from_json_rejects_missing_and_blank() {
        assert_eq!(ExternalId::from_json(None), Err(ExternalIdError::Missing));
        assert_eq!(
            ExternalId::from_json(Some(&Value::Null)),
            Err(ExternalIdError::Missing)
        );
        assert_eq!(
            ExternalId::from_json(Some(&json!(""))),
            Err(ExternalIdError::Blank)
        );
        assert_eq!(
            ExternalId::from_json(Some(&json!({"id": 1}))),
            Err(ExternalIdError::UnsupportedType("object"))
        );
    }
}
