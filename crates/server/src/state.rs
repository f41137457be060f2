//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::db::PgSyncStore;
use crate::services::auth::JwtKeys;
use crate::sync::SyncService;
use crate::zoho::{ZohoClient, ZohoError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    jwt: JwtKeys,
    sync: Arc<SyncService>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Builds the Zoho client and the sync service on top of `pool`.
    ///
    /// # Errors
    ///
    /// Returns `ZohoError::Http` if the HTTP client cannot be built.
    pub fn new(config: ServerConfig, pool: PgPool) -> Result<Self, ZohoError> {
        let zoho = ZohoClient::new(config.zoho.clone())?;
        let sync = Arc::new(SyncService::new(
            zoho,
            PgSyncStore::new(pool.clone()),
            config.sync.commit_mode,
        ));
        let jwt = JwtKeys::new(&config.jwt_secret);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                jwt,
                sync,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get the JWT signing and verification keys.
    #[must_use]
    pub fn jwt(&self) -> &JwtKeys {
        &self.inner.jwt
    }

    /// Get a handle to the sync service, shared with the scheduler.
    #[must_use]
    pub fn sync(&self) -> &Arc<SyncService> {
        &self.inner.sync
    }
}
