//! User account commands.
//!
//! # Usage
//!
//! ```bash
//! KDH_USER_PASSWORD='...' kdh-cli user create -u ops -e ops@example.com -f Ada -l Obi
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `KDH_USER_PASSWORD` - Password for the new account, kept out of shell history

use kool_data_hub_server::db::{self, UserRepository};
use kool_data_hub_server::models::NewUser;
use kool_data_hub_server::services::auth::{self, AuthError};
use thiserror::Error;

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Create a user account with the same validation as the signup endpoint.
///
/// # Errors
///
/// Returns `UserError::Auth` if validation fails or the email is taken.
pub async fn create(
    username: String,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
) -> Result<(), UserError> {
    let database_url = super::database_url().ok_or(UserError::MissingEnvVar("DATABASE_URL"))?;
    let password = std::env::var("KDH_USER_PASSWORD")
        .map_err(|_| UserError::MissingEnvVar("KDH_USER_PASSWORD"))?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    let user = auth::register_user(
        &UserRepository::new(&pool),
        NewUser {
            username,
            email,
            first_name,
            last_name,
            password,
        },
    )
    .await?;

    tracing::info!(
        "User created successfully! UID: {}, Email: {}",
        user.uid,
        user.email
    );
    Ok(())
}
