//! User account repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use kool_data_hub_core::{Email, UserId};

use super::RepositoryError;
use crate::models::User;

/// Row shape of `kool_assembly.user_accounts`.
#[derive(sqlx::FromRow)]
struct UserRow {
    uid: UserId,
    username: String,
    first_name: Option<String>,
    last_name: Option<String>,
    is_verified: bool,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<(User, String), RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok((
            User {
                uid: self.uid,
                username: self.username,
                first_name: self.first_name,
                last_name: self.last_name,
                is_verified: self.is_verified,
                email,
                created_at: self.created_at,
            },
            self.password_hash,
        ))
    }
}

/// Fields for a new account; the password is already hashed.
pub struct CreateUser<'a> {
    pub username: &'a str,
    pub email: &'a Email,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub password_hash: &'a str,
}

/// Repository for user account operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user and their password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT uid, username, first_name, last_name, is_verified,
                   email, password_hash, created_at
            FROM kool_assembly.user_accounts
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    /// Insert a new account inside one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new_user: CreateUser<'_>) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO kool_assembly.user_accounts
                (uid, username, email, first_name, last_name, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING uid, username, first_name, last_name, is_verified,
                      email, password_hash, created_at
            ",
        )
        .bind(UserId::generate())
        .bind(new_user.username)
        .bind(new_user.email)
        .bind(new_user.first_name)
        .bind(new_user.last_name)
        .bind(new_user.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        tx.commit().await?;

        row.into_user().map(|(user, _)| user)
    }
}
