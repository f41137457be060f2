//! Zoho OAuth token exchange.
//!
//! Every sync invocation trades the long-lived refresh token for a fresh
//! access token. Tokens are not cached between invocations.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use super::{ZohoError, with_retry};
use crate::config::ZohoConfig;

/// Successful or failed body of the token endpoint.
///
/// Zoho answers some failures with HTTP 200 and an `error` field.
#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Exchanges the configured refresh token for bearer tokens.
#[derive(Clone)]
pub struct TokenProvider {
    http: reqwest::Client,
    config: ZohoConfig,
}

impl TokenProvider {
    #[must_use]
    pub const fn new(http: reqwest::Client, config: ZohoConfig) -> Self {
        Self { http, config }
    }

    /// Fetch a new access token, retrying connect failures per the config.
    ///
    /// # Errors
    ///
    /// Returns `ZohoError::AuthenticationFailed` on a non-success status or an
    /// error body, and `ZohoError::Http` when retries are exhausted.
    #[instrument(skip(self))]
    pub async fn access_token(&self) -> Result<SecretString, ZohoError> {
        with_retry(self.config.token_retry, "Zoho token exchange", || {
            self.request_token()
        })
        .await
    }

    async fn request_token(&self) -> Result<SecretString, ZohoError> {
        let url = format!("{}/oauth/v2/token", self.config.accounts_url);
        let params = [
            ("refresh_token", self.config.refresh_token.expose_secret()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret()),
            ("grant_type", "refresh_token"),
        ];

        let response = self.http.post(&url).form(&params).send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ZohoError::AuthenticationFailed(format!(
                "HTTP {status}: {error_text}"
            )));
        }

        let body: TokenResponse = response.json().await?;
        if let Some(error) = body.error {
            return Err(ZohoError::AuthenticationFailed(error));
        }

        body.access_token.map(SecretString::from).ok_or_else(|| {
            ZohoError::AuthenticationFailed("response has no access_token".to_string())
        })
    }
}
