//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (database)
//!
//! # Auth
//! POST /api/v1/auth/signup              - Create account
//! POST /api/v1/auth/login               - Email/password login
//! POST /api/v1/auth/refresh             - New access token (refresh token)
//!
//! # Assembly line (access token)
//! /api/v1/batteries                     - Battery tests
//! /api/v1/inverters                     - Inverter records (no serial lookup)
//! /api/v1/iot                           - IoT device records
//! /api/v1/paygo                         - Paygo activations
//! /api/v1/production                    - Production records
//! /api/v1/quality                       - Quality checks
//! /api/v1/inventory-in                  - Stock received
//! /api/v1/inventory-return              - Stock returned
//!
//! # Zoho (access token)
//! GET  /api/v1/zoho                     - Synced resources
//! GET  /api/v1/zoho/{resource}          - Synced rows
//! GET  /api/v1/zoho/{resource}/{id}     - One synced row
//! POST /api/v1/zoho/{resource}/sync     - Run a sync job now
//! ```
//!
//! See [`assembly`] for the per-collection CRUD routes.

pub mod assembly;
pub mod auth;
pub mod health;
pub mod zoho;

use axum::{
    Router,
    routing::{get, post},
};

use crate::models::AssemblyResource;
use crate::models::assembly::{
    Battery, InventoryIn, InventoryReturn, Inverter, Iot, Paygo, Production, Quality,
};
use crate::state::AppState;

/// Build the complete route tree.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/v1", api_routes())
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .merge(collection::<Battery>())
        .merge(collection::<Inverter>())
        .merge(collection::<Iot>())
        .merge(collection::<Paygo>())
        .merge(collection::<Production>())
        .merge(collection::<Quality>())
        .merge(collection::<InventoryIn>())
        .merge(collection::<InventoryReturn>())
        .nest("/zoho", zoho::router())
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
}

fn collection<R: AssemblyResource>() -> Router<AppState> {
    Router::new().nest(&format!("/{}", R::COLLECTION), assembly::router::<R>())
}
