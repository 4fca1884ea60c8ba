//! Endpoint client tests against a mock server.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Client;
use secrecy::Secret;
use serde_json::json;
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use metering_client::models::{UsageDocument, UsageMeasure};
use metering_client::services::{CollectorClient, ReportingClient, UaaClient};
use metering_client::ClientError;

fn uaa_for(server: &MockServer) -> Arc<UaaClient> {
    Arc::new(UaaClient::new(
        Client::new(),
        format!("{}/oauth/token", server.uri()),
        "demo-client".to_string(),
        Secret::new("demo-secret".to_string()),
    ))
}

async fn mount_token_endpoint(server: &MockServer, expires_in_secs: i64, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "bearer",
            "access_token": "ey47110815",
            "expires_in": expires_in_secs,
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn token_is_cached_while_valid() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 600, 1).await;

    let uaa = uaa_for(&server);
    let first = uaa.authorization().await.expect("first exchange");
    let second = uaa.authorization().await.expect("served from cache");
    assert_eq!(first, "bearer ey47110815");
    assert_eq!(second, first);
}

#[tokio::test]
async fn stale_token_is_exchanged_again() {
    let server = MockServer::start().await;
    // expires_in 0 puts the expiry (after the safety margin) in the past.
    mount_token_endpoint(&server, 0, 2).await;

    let uaa = uaa_for(&server);
    uaa.authorization().await.expect("first exchange");
    uaa.authorization().await.expect("second exchange");
}

#[tokio::test]
async fn token_error_envelope_is_auth_error_and_nothing_is_cached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "unauthorized",
            "error_description": "Bad credentials",
        })))
        .expect(2)
        .mount(&server)
        .await;

    let uaa = uaa_for(&server);
    for _ in 0..2 {
        let err = uaa.authorization().await.expect_err("exchange rejected");
        assert!(matches!(err, ClientError::AuthError(_)), "got {:?}", err);
    }
}

#[tokio::test]
async fn collector_submits_with_bearer_authorization() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 600, 1).await;

    let document = UsageDocument::build(
        "app-1",
        "space-1",
        "org-1",
        "object-storage",
        "instance-1",
        "standard",
        vec![UsageMeasure {
            measure: "heavy_api_calls".to_string(),
            quantity: 100,
        }],
        DateTime::from_timestamp_millis(1_435_629_365_220).expect("valid timestamp"),
    );

    Mock::given(method("POST"))
        .and(path("/v1/metering/collected/usage"))
        .and(header("Authorization", "bearer ey47110815"))
        .and(wiremock::matchers::body_json(
            serde_json::to_value(&document).expect("serialize"),
        ))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("Location", "/v1/metering/collected/usage/t/123"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let collector = CollectorClient::new(
        Client::new(),
        format!("{}/v1/metering/collected/usage", server.uri()),
        uaa_for(&server),
    );
    let outcome = collector.submit(&document).await.expect("submission sent");
    assert_eq!(outcome.status.as_u16(), 201);
    assert_eq!(
        outcome.location.as_deref(),
        Some("/v1/metering/collected/usage/t/123")
    );
}

#[tokio::test]
async fn collector_surfaces_non_success_status_as_data() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 600, 1).await;

    Mock::given(method("POST"))
        .and(path("/v1/metering/collected/usage"))
        .respond_with(ResponseTemplate::new(409))
        .expect(1)
        .mount(&server)
        .await;

    let collector = CollectorClient::new(
        Client::new(),
        format!("{}/v1/metering/collected/usage", server.uri()),
        uaa_for(&server),
    );
    let document = UsageDocument::build(
        "app-1",
        "space-1",
        "org-1",
        "object-storage",
        "instance-1",
        "standard",
        vec![],
        Utc::now(),
    );
    let outcome = collector.submit(&document).await.expect("status is data");
    assert_eq!(outcome.status.as_u16(), 409);
    assert_eq!(outcome.location, None);
}

#[tokio::test]
async fn unreachable_collector_is_a_transport_error() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 600, 1).await;

    // Port 9 is unassigned locally; the connection is refused.
    let collector = CollectorClient::new(
        Client::new(),
        "http://127.0.0.1:9/v1/metering/collected/usage".to_string(),
        uaa_for(&server),
    );
    let document = UsageDocument::build(
        "app-1",
        "space-1",
        "org-1",
        "object-storage",
        "instance-1",
        "standard",
        vec![],
        Utc::now(),
    );
    let err = collector.submit(&document).await.expect_err("unreachable");
    assert!(matches!(err, ClientError::Transport(_)), "got {:?}", err);
}

#[tokio::test]
async fn reporting_parses_the_aggregated_report() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 600, 1).await;

    Mock::given(method("GET"))
        .and(path_regex(
            r"^/v1/metering/organizations/org-1/aggregated/usage/\d+$",
        ))
        .and(header("Authorization", "bearer ey47110815"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "organization_id": "org-1",
            "spaces": [{
                "space_id": "sp1",
                "resources": [{
                    "resource_id": "object-storage",
                    "aggregated_usage": [{
                        "metric": "heavy_api_calls",
                        "windows": [
                            [], [], [], [],
                            [{"quantity": 5, "summary": 1000}, {"quantity": 3, "summary": 800}]
                        ]
                    }]
                }]
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reporting = ReportingClient::new(Client::new(), server.uri(), uaa_for(&server));
    let report = reporting
        .organization_report("org-1", Utc::now())
        .await
        .expect("report parsed");
    assert_eq!(report.organization_id, "org-1");
    assert!(report.space("sp1").is_some());
}

#[tokio::test]
async fn reporting_error_envelope_is_bad_gateway() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 600, 1).await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/v1/metering/organizations/.*$"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": "econsistency",
            "message": "Report not yet consistent",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reporting = ReportingClient::new(Client::new(), server.uri(), uaa_for(&server));
    let err = reporting
        .organization_report("org-1", Utc::now())
        .await
        .expect_err("error envelope");
    assert!(matches!(err, ClientError::BadGateway(_)), "got {:?}", err);
}

#[tokio::test]
async fn reporting_unexpected_shape_is_malformed() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 600, 1).await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/v1/metering/organizations/.*$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "spaces": "not-an-array",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reporting = ReportingClient::new(Client::new(), server.uri(), uaa_for(&server));
    let err = reporting
        .organization_report("org-1", Utc::now())
        .await
        .expect_err("shape violates the contract");
    assert!(
        matches!(err, ClientError::MalformedReport(_)),
        "got {:?}",
        err
    );
}

#[tokio::test]
async fn token_endpoint_is_discovered_from_platform_info() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_endpoint": "https://uaa.example.com",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let url = UaaClient::discover_token_url(&Client::new(), &server.uri())
        .await
        .expect("info endpoint answered");
    assert_eq!(url, "https://uaa.example.com/oauth/token");
}
