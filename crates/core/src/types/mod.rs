//! Core types for Kool Data Hub.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod column;
pub mod email;
pub mod external_id;
pub mod id;

pub use column::{ColumnType, ColumnValue};
pub use email::{Email, EmailError};
pub use external_id::{ExternalId, ExternalIdError};
pub use id::*;
