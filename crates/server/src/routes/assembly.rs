//! Generic CRUD routes for assembly-line tables.
//!
//! ```text
//! GET    /                  - List, newest first
//! POST   /                  - Create (201)
//! GET    /{uid}             - Get by uid
//! GET    /serial/{serial}   - Get by product serial number (tables with one)
//! PATCH  /{uid}             - Partial update
//! DELETE /{uid}             - Delete (204)
//! ```
//!
//! Every route requires an access token.

use axum::{
    Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    routing::get,
};

use kool_data_hub_core::RecordUid;

use crate::db::{AssemblyRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAccessToken;
use crate::models::AssemblyResource;
use crate::state::AppState;

type JsonBody<T> = std::result::Result<Json<T>, JsonRejection>;
type PathParam<T> = std::result::Result<Path<T>, PathRejection>;

/// Create the CRUD router for one table.
pub fn router<R: AssemblyResource>() -> Router<AppState> {
    let router = Router::new()
        .route("/", get(list::<R>).post(create::<R>))
        .route(
            "/{uid}",
            get(show::<R>).patch(update::<R>).delete(destroy::<R>),
        );

    if R::SERIAL_COLUMN.is_some() {
        router.route("/serial/{serial}", get(show_by_serial::<R>))
    } else {
        router
    }
}

fn not_found<R: AssemblyResource>(uid: RecordUid) -> AppError {
    AppError::NotFound(format!("{} record with UID '{uid}' not found", R::LABEL))
}

fn or_not_found<R: AssemblyResource>(uid: RecordUid) -> impl FnOnce(RepositoryError) -> AppError {
    move |e| match e {
        RepositoryError::NotFound => not_found::<R>(uid),
        other => AppError::Database(other),
    }
}

async fn list<R: AssemblyResource>(
    _auth: RequireAccessToken,
    State(state): State<AppState>,
) -> Result<Json<Vec<R::Record>>> {
    let records = AssemblyRepository::<R>::new(state.pool()).list().await?;
    Ok(Json(records))
}

async fn create<R: AssemblyResource>(
    _auth: RequireAccessToken,
    State(state): State<AppState>,
    payload: JsonBody<R::Create>,
) -> Result<(StatusCode, Json<R::Record>)> {
    let Json(input) = payload?;
    let record = AssemblyRepository::<R>::new(state.pool())
        .create(input)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn show<R: AssemblyResource>(
    _auth: RequireAccessToken,
    State(state): State<AppState>,
    uid: PathParam<RecordUid>,
) -> Result<Json<R::Record>> {
    let Path(uid) = uid?;
    AssemblyRepository::<R>::new(state.pool())
        .get(uid)
        .await?
        .map(Json)
        .ok_or_else(|| not_found::<R>(uid))
}

async fn show_by_serial<R: AssemblyResource>(
    _auth: RequireAccessToken,
    State(state): State<AppState>,
    Path(serial): Path<String>,
) -> Result<Json<R::Record>> {
    AssemblyRepository::<R>::new(state.pool())
        .get_by_serial(&serial)
        .await?
        .map(Json)
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "{} record with serial number '{serial}' not found",
                R::LABEL
            ))
        })
}

async fn update<R: AssemblyResource>(
    _auth: RequireAccessToken,
    State(state): State<AppState>,
    uid: PathParam<RecordUid>,
    payload: JsonBody<R::Update>,
) -> Result<Json<R::Record>> {
    let Path(uid) = uid?;
    let Json(input) = payload?;
    let record = AssemblyRepository::<R>::new(state.pool())
        .update(uid, input)
        .await
        .map_err(or_not_found::<R>(uid))?;
    Ok(Json(record))
}

async fn destroy<R: AssemblyResource>(
    _auth: RequireAccessToken,
    State(state): State<AppState>,
    uid: PathParam<RecordUid>,
) -> Result<StatusCode> {
    let Path(uid) = uid?;
    AssemblyRepository::<R>::new(state.pool())
        .delete(uid)
        .await
        .map_err(or_not_found::<R>(uid))?;
    Ok(StatusCode::NO_CONTENT)
}
