#![allow(clippy::unwrap_used)]
// Integration tests for `CatalystClient` using wiremock.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{basic_auth, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use catalyst_api::{
    ApiRequest, CatalystClient, Credential, Error, Transport, TransportConfig, paths,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, CatalystClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = CatalystClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

fn credential(server: &MockServer, secret: &str) -> Credential {
    Credential::new(
        Url::parse(&server.uri()).unwrap(),
        "devnetuser",
        SecretString::from(secret.to_string()),
    )
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_exchange_credential_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/dna/system/api/v1/auth/token"))
        .and(basic_auth("devnetuser", "Cisco123!"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Token": "tok-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let grant = client
        .exchange_credential(&credential(&server, "Cisco123!"))
        .await
        .unwrap();

    assert_eq!(grant.value, "tok-1");
    assert_eq!(grant.ttl, None);
}

#[tokio::test]
async fn test_exchange_credential_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/dna/system/api/v1/auth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "Authentication has failed. Please provide valid credentials."
        })))
        .mount(&server)
        .await;

    let result = client
        .exchange_credential(&credential(&server, "wrong-password"))
        .await;

    match result {
        Err(Error::Authentication { status, ref message }) => {
            assert_eq!(status, 401);
            assert!(message.contains("Authentication has failed"), "got: {message}");
            assert!(!message.contains("wrong-password"));
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_exchange_credential_malformed_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/dna/system/api/v1/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "lowercase" })))
        .mount(&server)
        .await;

    let result = client
        .exchange_credential(&credential(&server, "Cisco123!"))
        .await;

    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_exchange_credential_slow_controller_reports_timeout() {
    let server = MockServer::start().await;
    let transport = TransportConfig {
        timeout: Duration::from_secs(1),
        ..TransportConfig::default()
    };
    let client = CatalystClient::new(Url::parse(&server.uri()).unwrap(), &transport).unwrap();

    Mock::given(method("POST"))
        .and(path("/dna/system/api/v1/auth/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "Token": "tok-1" }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let result = client
        .exchange_credential(&credential(&server, "Cisco123!"))
        .await;

    assert!(
        matches!(result, Err(Error::Timeout { timeout_secs: 1 })),
        "expected Timeout after 1s, got: {result:?}"
    );
}

// ── Request tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_send_attaches_token_and_params() {
    let (server, client) = setup().await;

    let body = json!({
        "response": [{ "hostname": "cat9k-edge-1", "managementIpAddress": "10.10.20.81" }],
        "version": "1.0"
    });

    Mock::given(method("GET"))
        .and(path(paths::NETWORK_DEVICES))
        .and(header("X-Auth-Token", "tok-1"))
        .and(header("Accept", "application/json"))
        .and(query_param("hostname", ".*edge.*"))
        .and(query_param("offset", "1"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let request = ApiRequest::get(paths::NETWORK_DEVICES).with_params([
        ("hostname".to_string(), ".*edge.*".to_string()),
        ("offset".to_string(), "1".to_string()),
        ("limit".to_string(), "100".to_string()),
    ]);

    let resp = client.send(&request, "tok-1").await.unwrap();

    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, body);
}

#[tokio::test]
async fn test_send_token_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.send(&ApiRequest::get(paths::SITES), "stale").await;

    let err = result.unwrap_err();
    assert!(err.is_auth_expired(), "expected Authentication error, got: {err:?}");
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn test_send_not_found_is_api_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(paths::client("aa:bb:cc:dd:ee:ff")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "response": { "errorCode": "NOT_FOUND", "message": "Client not found" }
        })))
        .mount(&server)
        .await;

    let result = client
        .send(&ApiRequest::get(paths::client("aa:bb:cc:dd:ee:ff")), "tok")
        .await;

    let err = result.unwrap_err();
    assert!(err.is_not_found(), "expected not-found, got: {err:?}");
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 404);
            assert!(message.contains("Client not found"), "got: {message}");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_send_empty_body_is_null() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(paths::CLIENTS))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let resp = client
        .send(&ApiRequest::get(paths::CLIENTS), "tok")
        .await
        .unwrap();

    assert_eq!(resp.status, 204);
    assert!(resp.body.is_null());
}

#[tokio::test]
async fn test_send_invalid_json() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(paths::SITES))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let result = client.send(&ApiRequest::get(paths::SITES), "tok").await;

    match result {
        Err(Error::Deserialization { ref body, .. }) => {
            assert!(body.contains("<html>"));
        }
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}
