//! Signup, login and token refresh.

use axum::{Json, extract::State, extract::rejection::JsonRejection, http::StatusCode};

use crate::error::Result;
use crate::middleware::RequireRefreshToken;
use crate::models::{LoginRequest, NewUser, User};
use crate::services::auth::{AuthService, LoginResponse, RefreshResponse};
use crate::state::AppState;

/// Create a user account.
pub async fn signup(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<User>)> {
    let Json(input) = payload?;
    let user = AuthService::new(state.pool(), state.jwt())
        .signup(input)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Exchange email and password for an access/refresh token pair.
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>> {
    let Json(input) = payload?;
    let response = AuthService::new(state.pool(), state.jwt())
        .login(&input.email, &input.password)
        .await?;
    Ok(Json(response))
}

/// Issue a new access token from a refresh token.
pub async fn refresh(
    State(state): State<AppState>,
    RequireRefreshToken(claims): RequireRefreshToken,
) -> Result<Json<RefreshResponse>> {
    let response = AuthService::new(state.pool(), state.jwt()).refresh(&claims)?;
    Ok(Json(response))
}
