//! Subcommand implementations.

pub mod migrate;
pub mod sync;
pub mod user;

use secrecy::SecretString;

/// Read `DATABASE_URL`, loading `.env` first.
fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();
    std::env::var("DATABASE_URL").ok().map(SecretString::from)
}
