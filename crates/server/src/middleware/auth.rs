//! Bearer-token extractors.
//!
//! Provides extractors for requiring a valid JWT in route handlers.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::AppError;
use crate::services::auth::{AuthError, Claims};
use crate::state::AppState;

/// Extractor that requires a valid, unexpired access token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAccessToken(claims): RequireAccessToken,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", claims.user.email)
/// }
/// ```
pub struct RequireAccessToken(pub Claims);

/// Extractor that requires a valid, unexpired refresh token.
pub struct RequireRefreshToken(pub Claims);

impl FromRequestParts<AppState> for RequireAccessToken {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.jwt().verify_access(token)?;
        Ok(Self(claims))
    }
}

impl FromRequestParts<AppState> for RequireRefreshToken {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.jwt().verify_refresh(token)?;
        Ok(Self(claims))
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/v1/batteries");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        #[allow(clippy::unwrap_used)]
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc.def.ghi"))).ok(), Some("abc.def.ghi"));
        assert!(bearer_token(&parts(None)).is_err());
        assert!(bearer_token(&parts(Some("Basic dXNlcjpwYXNz"))).is_err());
        assert!(bearer_token(&parts(Some("Bearer   "))).is_err());
    }
}
