//! Authentication service.
//!
//! Provides password signup/login and JWT issuance for the dashboard API.

mod error;
pub mod jwt;

pub use error::AuthError;
pub use jwt::{Claims, JwtKeys, TokenUser};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Serialize;
use sqlx::PgPool;

use kool_data_hub_core::Email;

use crate::db::RepositoryError;
use crate::db::users::{CreateUser, UserRepository};
use crate::models::{NewUser, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Allowed username length in characters.
const USERNAME_LENGTH: std::ops::RangeInclusive<usize> = 3..=50;

/// Successful login body.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub message: &'static str,
    pub user: TokenUser,
}

/// Response of the refresh endpoint.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    keys: &'a JwtKeys,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, keys: &'a JwtKeys) -> Self {
        Self {
            users: UserRepository::new(pool),
            keys,
        }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// See [`register_user`].
    pub async fn signup(&self, input: NewUser) -> Result<User, AuthError> {
        register_user(&self.users, input).await
    }

    /// Verify credentials and issue an access/refresh token pair.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email is unknown or
    /// malformed or the password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        let token_user = TokenUser {
            uid: user.uid,
            email: user.email.into_inner(),
        };

        Ok(LoginResponse {
            access_token: self.keys.issue(&token_user, false)?,
            refresh_token: self.keys.issue(&token_user, true)?,
            message: "Login Successful",
            user: token_user,
        })
    }

    /// Issue a new access token for the holder of a verified refresh token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenEncoding` if signing fails.
    pub fn refresh(&self, claims: &Claims) -> Result<RefreshResponse, AuthError> {
        Ok(RefreshResponse {
            access_token: self.keys.issue(&claims.user, false)?,
        })
    }
}

/// Validate and store a new account.
///
/// Shared by the signup endpoint and the CLI, which has no JWT keys.
///
/// # Errors
///
/// Returns `AuthError::InvalidInput` if the username length is out of range.
/// Returns `AuthError::InvalidEmail` if the email format is invalid.
/// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
/// Returns `AuthError::UserAlreadyExists` if the email is already registered.
pub async fn register_user(users: &UserRepository<'_>, input: NewUser) -> Result<User, AuthError> {
    let username = validate_username(&input.username)?;
    let email = Email::parse(&input.email)?;
    validate_password(&input.password)?;

    let password_hash = hash_password(&input.password)?;

    let user = users
        .create(CreateUser {
            username,
            email: &email,
            first_name: non_blank(input.first_name.as_deref()),
            last_name: non_blank(input.last_name.as_deref()),
            password_hash: &password_hash,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Repository(other),
        })?;

    tracing::info!(user_id = %user.uid, "User signed up");
    Ok(user)
}

/// Validate and trim a username.
fn validate_username(username: &str) -> Result<&str, AuthError> {
    let trimmed = username.trim();
    if !USERNAME_LENGTH.contains(&trimmed.chars().count()) {
        return Err(AuthError::InvalidInput(format!(
            "username must be between {} and {} characters",
            USERNAME_LENGTH.start(),
            USERNAME_LENGTH.end()
        )));
    }
    Ok(trimmed)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
