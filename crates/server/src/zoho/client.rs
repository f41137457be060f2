//! Zoho Inventory list client.
//!
//! Fetches every page of a list endpoint and returns the raw records. Pages
//! are requested sequentially with a fixed pause between them; the first
//! empty or short page ends the fetch.

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::instrument;

use super::resources::ResourceDescriptor;
use super::{TokenProvider, ZohoError, with_retry};
use crate::config::ZohoConfig;

/// Upper bound on pages per fetch, guarding against endpoints that never
/// return a short page.
pub const MAX_PAGES: u32 = 1000;

/// Zoho error code for an invalid query parameter.
const INVALID_PARAMETER_CODE: i64 = 2;

/// Zoho Inventory API client.
#[derive(Clone)]
pub struct ZohoClient {
    inner: Arc<ZohoClientInner>,
}

struct ZohoClientInner {
    http: reqwest::Client,
    tokens: TokenProvider,
    config: ZohoConfig,
}

/// Outcome of a single page request.
enum PageOutcome {
    Records(Vec<Value>),
    /// Zoho rejected a query parameter (HTTP 400, code 2).
    InvalidParameter(String),
}

impl ZohoClient {
    /// Create a client with a 30 second per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns `ZohoError::Http` if the HTTP client cannot be built.
    pub fn new(config: ZohoConfig) -> Result<Self, ZohoError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            inner: Arc::new(ZohoClientInner {
                tokens: TokenProvider::new(http.clone(), config.clone()),
                http,
                config,
            }),
        })
    }

    /// Exchange the refresh token for a bearer token.
    ///
    /// # Errors
    ///
    /// See [`TokenProvider::access_token`].
    pub async fn access_token(&self) -> Result<SecretString, ZohoError> {
        self.inner.tokens.access_token().await
    }

    /// Fetch every record of `resource`.
    ///
    /// Any non-success page aborts the fetch and discards what was fetched.
    /// A rejected optional parameter (sort, include) is dropped and the page
    /// retried once; later pages are requested without it.
    ///
    /// # Errors
    ///
    /// Returns `ZohoError` on transport failures, non-2xx statuses, invalid
    /// JSON or a body missing the resource's array key.
    #[instrument(skip(self, token), fields(resource = resource.name))]
    pub async fn fetch_all(
        &self,
        resource: &ResourceDescriptor,
        token: &SecretString,
    ) -> Result<Vec<Value>, ZohoError> {
        let per_page = self.inner.config.page_size;
        let mut records = Vec::new();
        let mut include_optional = true;
        let mut page = 1;

        loop {
            let mut outcome = self
                .fetch_page_with_retry(resource, token, page, include_optional)
                .await?;

            if let PageOutcome::InvalidParameter(message) = &outcome {
                if !include_optional || resource.optional_params.is_empty() {
                    return Err(ZohoError::Status {
                        endpoint: resource.endpoint.to_string(),
                        status: 400,
                        body: message.clone(),
                    });
                }
                tracing::warn!(page, %message, "Zoho rejected optional parameters, retrying without them");
                include_optional = false;
                outcome = self
                    .fetch_page_with_retry(resource, token, page, include_optional)
                    .await?;
            }

            let batch = match outcome {
                PageOutcome::Records(batch) => batch,
                PageOutcome::InvalidParameter(message) => {
                    return Err(ZohoError::Status {
                        endpoint: resource.endpoint.to_string(),
                        status: 400,
                        body: message,
                    });
                }
            };

            let count = batch.len();
            records.extend(batch);
            tracing::debug!(page, count, total = records.len(), "Fetched page");

            if count < per_page as usize {
                break;
            }
            if page >= MAX_PAGES {
                tracing::warn!(page, total = records.len(), "Page cap reached, stopping fetch");
                break;
            }

            page += 1;
            tokio::time::sleep(self.inner.config.page_delay).await;
        }

        tracing::info!(total = records.len(), "Fetched records from Zoho");
        Ok(records)
    }

    async fn fetch_page_with_retry(
        &self,
        resource: &ResourceDescriptor,
        token: &SecretString,
        page: u32,
        include_optional: bool,
    ) -> Result<PageOutcome, ZohoError> {
        with_retry(resource.page_retry, "Zoho page fetch", || {
            self.fetch_page(resource, token, page, include_optional)
        })
        .await
    }

    async fn fetch_page(
        &self,
        resource: &ResourceDescriptor,
        token: &SecretString,
        page: u32,
        include_optional: bool,
    ) -> Result<PageOutcome, ZohoError> {
        let config = &self.inner.config;
        let url = format!("{}{}", config.api_url, resource.endpoint);

        let mut query: Vec<(&str, String)> = vec![
            ("organization_id", config.organization_id.clone()),
            ("page", page.to_string()),
            ("per_page", config.page_size.to_string()),
        ];
        query.extend(resource.params.iter().map(|(k, v)| (*k, (*v).to_string())));
        if include_optional {
            query.extend(
                resource
                    .optional_params
                    .iter()
                    .map(|(k, v)| (*k, (*v).to_string())),
            );
        }

        let response = self
            .inner
            .http
            .get(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Zoho-oauthtoken {}", token.expose_secret()),
            )
            .header("X-com-zoho-inventory-organizationid", &config.organization_id)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status == reqwest::StatusCode::BAD_REQUEST
            && let Some(message) = invalid_parameter_message(&body)
        {
            return Ok(PageOutcome::InvalidParameter(message));
        }

        if !status.is_success() {
            return Err(ZohoError::Status {
                endpoint: resource.endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let mut data: Value = serde_json::from_str(&body)?;
        match data.get_mut(resource.array_key).map(Value::take) {
            Some(Value::Array(records)) => Ok(PageOutcome::Records(records)),
            _ => Err(ZohoError::MissingArrayKey {
                endpoint: resource.endpoint.to_string(),
                key: resource.array_key.to_string(),
            }),
        }
    }
}

/// Returns Zoho's message if `body` is an invalid-parameter error.
fn invalid_parameter_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    if value.get("code").and_then(Value::as_i64) != Some(INVALID_PARAMETER_CODE) {
        return None;
    }
    Some(
        value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("invalid parameter")
            .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_message() {
        assert_eq!(
            invalid_parameter_message(r#"{"code":2,"message":"Invalid value passed for sort_column"}"#),
            Some("Invalid value passed for sort_column".to_string())
        );
        assert_eq!(
            invalid_parameter_message(r#"{"code":2}"#),
            Some("invalid parameter".to_string())
        );
        assert_eq!(invalid_parameter_message(r#"{"code":57,"message":"x"}"#), None);
        assert_eq!(invalid_parameter_message("<html>bad gateway</html>"), None);
    }
}
