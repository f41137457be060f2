//! Zoho client tests against a mock Zoho server.

#![allow(clippy::unwrap_used)]

use kool_data_hub_integration_tests::{ORGANIZATION_ID, items, mount_page, mount_token, zoho_config};
use kool_data_hub_server::zoho::resources::{ITEMS, PACKAGES, VENDORS};
use kool_data_hub_server::zoho::{ZohoClient, ZohoError};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn token() -> SecretString {
    SecretString::from("1000.test-access-token")
}

// ============================================================================
// Token exchange
// ============================================================================

#[tokio::test]
async fn test_token_exchange_returns_access_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("client_id=1000.TESTCLIENT"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access_token": "1000.abc"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = ZohoClient::new(zoho_config(&server.uri(), 200)).unwrap();
    let token = client.access_token().await.unwrap();
    assert_eq!(token.expose_secret(), "1000.abc");
}

#[tokio::test]
async fn test_token_error_body_is_authentication_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "invalid_code"})))
        .mount(&server)
        .await;

    let client = ZohoClient::new(zoho_config(&server.uri(), 200)).unwrap();
    let err = client.access_token().await.unwrap_err();
    assert!(matches!(err, ZohoError::AuthenticationFailed(ref m) if m == "invalid_code"));
}

#[tokio::test]
async fn test_token_http_error_is_authentication_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized client"))
        .mount(&server)
        .await;

    let client = ZohoClient::new(zoho_config(&server.uri(), 200)).unwrap();
    let err = client.access_token().await.unwrap_err();
    match err {
        ZohoError::AuthenticationFailed(message) => {
            assert!(message.contains("401"), "{message}");
            assert!(message.contains("unauthorized client"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// ============================================================================
// Pagination
// ============================================================================

#[tokio::test]
async fn test_fetch_all_concatenates_pages_until_short_page() {
    let server = MockServer::start().await;
    mount_page(&server, &ITEMS, 1, items(1, 200)).await;
    mount_page(&server, &ITEMS, 2, items(201, 200)).await;
    mount_page(&server, &ITEMS, 3, items(401, 57)).await;

    let client = ZohoClient::new(zoho_config(&server.uri(), 200)).unwrap();
    let records = client.fetch_all(&ITEMS, &token()).await.unwrap();

    assert_eq!(records.len(), 457);
    assert_eq!(records[0]["item_id"], "1");
    assert_eq!(records[456]["item_id"], "457");
}

#[tokio::test]
async fn test_fetch_all_stops_on_empty_page() {
    let server = MockServer::start().await;
    mount_page(&server, &ITEMS, 1, items(1, 2)).await;
    mount_page(&server, &ITEMS, 2, Vec::new()).await;

    let client = ZohoClient::new(zoho_config(&server.uri(), 2)).unwrap();
    let records = client.fetch_all(&ITEMS, &token()).await.unwrap();
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn test_fetch_sends_auth_header_and_resource_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contacts"))
        .and(header("Authorization", "Zoho-oauthtoken 1000.test-access-token"))
        .and(query_param("organization_id", ORGANIZATION_ID))
        .and(query_param("contact_type", "vendor"))
        .and(query_param("per_page", "200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "contacts": [{"contact_id": "460000000026049", "contact_name": "Haier Thermocool"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ZohoClient::new(zoho_config(&server.uri(), 200)).unwrap();
    let records = client.fetch_all(&VENDORS, &token()).await.unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_failed_page_discards_partial_fetch() {
    let server = MockServer::start().await;
    mount_page(&server, &ITEMS, 1, items(1, 2)).await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;

    let client = ZohoClient::new(zoho_config(&server.uri(), 2)).unwrap();
    let err = client.fetch_all(&ITEMS, &token()).await.unwrap_err();
    assert!(matches!(err, ZohoError::Status { status: 500, .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_missing_array_key_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 0, "message": "success"})))
        .mount(&server)
        .await;

    let client = ZohoClient::new(zoho_config(&server.uri(), 200)).unwrap();
    let err = client.fetch_all(&ITEMS, &token()).await.unwrap_err();
    assert!(matches!(err, ZohoError::MissingArrayKey { ref key, .. } if key == "items"));
}

#[tokio::test]
async fn test_rejected_optional_params_are_dropped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/packages"))
        .and(query_param("sort_column", "last_modified_time"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 2,
            "message": "Invalid value passed for sort_column"
        })))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/packages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "packages": [{"package_id": "P-1"}, {"package_id": "P-2"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ZohoClient::new(zoho_config(&server.uri(), 200)).unwrap();
    let records = client.fetch_all(&PACKAGES, &token()).await.unwrap();
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn test_invalid_parameter_without_optional_params_fails() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 2,
            "message": "Invalid value passed for page"
        })))
        .mount(&server)
        .await;

    let client = ZohoClient::new(zoho_config(&server.uri(), 200)).unwrap();
    let err = client.fetch_all(&ITEMS, &token()).await.unwrap_err();
    assert!(matches!(err, ZohoError::Status { status: 400, .. }));
}
