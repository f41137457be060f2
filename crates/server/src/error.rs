//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Error bodies are JSON: `{"detail": "<message>"}`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::sync::SyncError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Sync job failed or was rejected.
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request body, path or query failed validation.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Sync(err) => match err {
                SyncError::AlreadyRunning(_) => StatusCode::CONFLICT,
                SyncError::UnknownResource(_) => StatusCode::NOT_FOUND,
                SyncError::Zoho(_) => StatusCode::BAD_GATEWAY,
                SyncError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials
                | AuthError::InvalidToken
                | AuthError::RefreshNotAllowed
                | AuthError::RefreshRequired => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists
                | AuthError::InvalidInput(_)
                | AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AuthError::TokenEncoding(_)
                | AuthError::Repository(_)
                | AuthError::PasswordHash => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    /// Client-facing message; internal details are never exposed.
    fn detail(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(_)) => "Resource already exists".to_string(),
            Self::Database(_) => "Internal server error".to_string(),
            Self::Sync(err) => match err {
                SyncError::AlreadyRunning(name) => format!("Sync for '{name}' is already running"),
                SyncError::UnknownResource(name) => format!("Unknown resource '{name}'"),
                SyncError::Zoho(_) => "Zoho Inventory request failed".to_string(),
                SyncError::Repository(_) => "Internal server error".to_string(),
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid email or password.".to_string(),
                AuthError::InvalidToken => "Invalid or expired token".to_string(),
                AuthError::RefreshNotAllowed => {
                    "Refresh token is not allowed for this endpoint".to_string()
                }
                AuthError::RefreshRequired => "Please provide a valid refresh token".to_string(),
                AuthError::UserAlreadyExists => "User with this email already exists.".to_string(),
                AuthError::InvalidInput(msg) | AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::TokenEncoding(_) | AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Internal server error".to_string()
                }
            },
            Self::NotFound(msg) | Self::Validation(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zoho::ZohoError;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("battery-123".to_string());
        assert_eq!(err.to_string(), "Not found: battery-123");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Validation("missing field".to_string())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::DataCorruption("x".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Sync(SyncError::AlreadyRunning("items".into()))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Sync(SyncError::Zoho(ZohoError::AuthenticationFailed(
                "invalid_code".into()
            )))),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_auth_statuses_and_messages() {
        let err = AppError::Auth(AuthError::UserAlreadyExists);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.detail(), "User with this email already exists.");

        let err = AppError::Auth(AuthError::RefreshNotAllowed);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.detail(), "Refresh token is not allowed for this endpoint");

        let err = AppError::Auth(AuthError::InvalidCredentials);
        assert_eq!(err.detail(), "Invalid email or password.");
    }

    #[test]
    fn test_conflict_has_own_detail() {
        let err = AppError::Database(RepositoryError::Conflict("email already exists".into()));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.detail(), "Resource already exists");
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption("bad row 42".into()));
        assert_eq!(err.detail(), "Internal server error");
    }
}
