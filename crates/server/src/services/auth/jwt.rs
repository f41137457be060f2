//! HS256 bearer tokens.
//!
//! Claims carry the user's uid and email, a unique `jti` and a `refresh`
//! flag separating access tokens from refresh tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use kool_data_hub_core::UserId;

use super::AuthError;

/// Access token lifetime in seconds.
pub const ACCESS_TOKEN_TTL_SECS: i64 = 3600;

/// Refresh token lifetime in seconds (2 days).
pub const REFRESH_TOKEN_TTL_SECS: i64 = 2 * 24 * 3600;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Identity embedded in every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUser {
    pub uid: UserId,
    pub email: String,
}

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user: TokenUser,
    /// Expiry as a Unix timestamp.
    pub exp: i64,
    pub jti: String,
    pub refresh: bool,
}

/// Signing and verification keys derived from `JWT_SECRET`.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys").finish_non_exhaustive()
    }
}

impl JwtKeys {
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }

    /// Issue an access token (1 hour) or a refresh token (2 days).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenEncoding` if signing fails.
    pub fn issue(&self, user: &TokenUser, refresh: bool) -> Result<String, AuthError> {
        let ttl = if refresh {
            REFRESH_TOKEN_TTL_SECS
        } else {
            ACCESS_TOKEN_TTL_SECS
        };
        self.issue_with_ttl(user, refresh, Duration::seconds(ttl))
    }

    /// Issue a token with an explicit lifetime.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenEncoding` if signing fails.
    pub fn issue_with_ttl(
        &self,
        user: &TokenUser,
        refresh: bool,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            user: user.clone(),
            exp: (Utc::now() + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
            refresh,
        };
        encode(&Header::new(ALGORITHM), &claims, &self.encoding).map_err(AuthError::TokenEncoding)
    }

    /// Verify signature and expiry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for any malformed, tampered or expired token.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &Validation::new(ALGORITHM))
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token rejected");
                AuthError::InvalidToken
            })
    }

    /// Verify an access token, rejecting refresh tokens.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` or `AuthError::RefreshNotAllowed`.
    pub fn verify_access(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.verify(token)?;
        if claims.refresh {
            return Err(AuthError::RefreshNotAllowed);
        }
        Ok(claims)
    }

    /// Verify a refresh token, rejecting access tokens.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` or `AuthError::RefreshRequired`.
    pub fn verify_refresh(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.verify(token)?;
        if !claims.refresh {
            return Err(AuthError::RefreshRequired);
        }
        Ok(claims)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn keys(secret: &str) -> JwtKeys {
        JwtKeys::new(&SecretString::from(secret.to_string()))
    }

    fn user() -> TokenUser {
        TokenUser {
            uid: UserId::generate(),
            email: "qa@koolboks.com".to_string(),
        }
    }

    #[test]
    fn test_access_token_roundtrip() {
        let keys = keys("x7Kp2mQ9vL4nR8sT1wY6zB3cF5hJ0dG!");
        let user = user();

        let token = keys.issue(&user, false).unwrap();
        let claims = keys.verify_access(&token).unwrap();

        assert_eq!(claims.user, user);
        assert!(!claims.refresh);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let keys = keys("x7Kp2mQ9vL4nR8sT1wY6zB3cF5hJ0dG!");
        let token = keys.issue(&user(), true).unwrap();

        assert!(matches!(keys.verify_access(&token), Err(AuthError::RefreshNotAllowed)));
        assert!(keys.verify_refresh(&token).is_ok());
    }

    #[test]
    fn test_access_token_rejected_as_refresh() {
        let keys = keys("x7Kp2mQ9vL4nR8sT1wY6zB3cF5hJ0dG!");
        let token = keys.issue(&user(), false).unwrap();

        assert!(matches!(keys.verify_refresh(&token), Err(AuthError::RefreshRequired)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = keys("x7Kp2mQ9vL4nR8sT1wY6zB3cF5hJ0dG!");
        let token = keys
            .issue_with_ttl(&user(), false, Duration::minutes(-5))
            .unwrap();

        assert!(matches!(keys.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let token = keys("x7Kp2mQ9vL4nR8sT1wY6zB3cF5hJ0dG!")
            .issue(&user(), false)
            .unwrap();
        let other = keys("Q4wE8rT2yU6iO0pA3sD7fG1hJ5kL9zX@");

        assert!(matches!(other.verify(&token), Err(AuthError::InvalidToken)));
        assert!(matches!(other.verify("not.a.jwt"), Err(AuthError::InvalidToken)));
    }
}
