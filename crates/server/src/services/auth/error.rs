//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] kool_data_hub_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Signup field failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Bearer token missing, malformed, tampered with or expired.
    #[error("invalid or expired token")]
    InvalidToken,

    /// A refresh token was presented where an access token is required.
    #[error("refresh token is not allowed for this endpoint")]
    RefreshNotAllowed,

    /// An access token was presented where a refresh token is required.
    #[error("refresh token required")]
    RefreshRequired,

    /// Token could not be signed.
    #[error("token encoding error: {0}")]
    TokenEncoding(#[source] jsonwebtoken::errors::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
