//! User account domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kool_data_hub_core::{Email, UserId};

/// A dashboard user account.
///
/// Serialized in API responses; the password hash never leaves the repository.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub uid: UserId,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Whether the account has been verified.
    pub is_verified: bool,
    pub email: Email,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

/// Signup request body.
#[derive(Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub password: String,
}

/// Login request body.
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}
