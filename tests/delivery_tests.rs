//! Delivery client tests against a fake provider

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use sms_gateway::config::Config;
use sms_gateway::delivery::{DeliveryClient, DeliveryStatus, INVALID_REQUEST_MESSAGE};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEND_PATH: &str = "/api/v1/sms/send";

fn test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.provider.username = "user".to_string();
    config.provider.password = "pass".to_string();
    config.provider.api_url = format!("{}{SEND_PATH}", server.uri());
    config.provider.timeout = Duration::from_secs(2);
    config.retry.initial_backoff = Duration::from_millis(1);
    config.retry.max_backoff = Duration::from_millis(5);
    config
}

#[tokio::test]
async fn sends_authenticated_json_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .and(header("authorization", "Basic dXNlcjpwYXNz"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "to": ["+46701234567"],
            "from": "TrafikInfo",
            "subject": "Test",
            "message": "Hello",
            "priority": "high"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "abc"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = DeliveryClient::new(&test_config(&server)).unwrap();
    let outcome = client.send("+46701234567", "Hello", Some("Test")).await;

    assert_eq!(outcome.status, DeliveryStatus::Success);
    assert_eq!(outcome.response, Some(json!({"id": "abc"})));
    assert_eq!(outcome.error, None);
}

#[tokio::test]
async fn missing_subject_uses_default() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(json!({
            "to": ["+46701234567"],
            "from": "TrafikInfo",
            "subject": "Meddelande",
            "message": "Hello",
            "priority": "high"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "def"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = DeliveryClient::new(&test_config(&server)).unwrap();
    let outcome = client.send("+46701234567", "Hello", None).await;
    assert!(outcome.is_success());
}

#[tokio::test]
async fn invalid_input_makes_no_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = DeliveryClient::new(&test_config(&server)).unwrap();
    for (recipient, message) in [("", "Hello"), ("+", "Hello"), ("46701234567", "Hello"), ("+46", "")] {
        let outcome = client.send(recipient, message, None).await;
        assert_eq!(outcome.status, DeliveryStatus::Error);
        assert_eq!(outcome.error.as_deref(), Some(INVALID_REQUEST_MESSAGE));
        assert_eq!(outcome.response, None);
    }

    let too_long = "x".repeat(161);
    let outcome = client.send("+46701234567", &too_long, None).await;
    assert_eq!(outcome.status, DeliveryStatus::Error);
}

#[tokio::test]
async fn retries_transient_status_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "after-retry"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = DeliveryClient::new(&test_config(&server)).unwrap();
    let outcome = client.send("+46701234567", "Hello", None).await;

    assert_eq!(outcome.status, DeliveryStatus::Success);
    assert_eq!(outcome.response, Some(json!({"id": "after-retry"})));
}

#[tokio::test]
async fn persistent_server_error_yields_error_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "internal"})))
        .expect(4)
        .mount(&server)
        .await;

    let client = DeliveryClient::new(&test_config(&server)).unwrap();
    let outcome = client.send("+46701234567", "Hello", None).await;

    assert_eq!(outcome.status, DeliveryStatus::Error);
    assert_eq!(outcome.error.as_deref(), Some("Provider returned HTTP 500"));
    assert_eq!(outcome.response, Some(json!({"error": "internal"})));
}

#[tokio::test]
async fn non_retryable_status_fails_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .expect(1)
        .mount(&server)
        .await;

    let client = DeliveryClient::new(&test_config(&server)).unwrap();
    let outcome = client.send("+46701234567", "Hello", None).await;

    assert_eq!(outcome.status, DeliveryStatus::Error);
    assert_eq!(outcome.error.as_deref(), Some("Provider returned HTTP 401"));
    // body was not JSON, so the payload falls back to an empty object
    assert_eq!(outcome.response, Some(json!({})));
}

#[tokio::test]
async fn success_with_unparsable_body_is_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(1)
        .mount(&server)
        .await;

    let client = DeliveryClient::new(&test_config(&server)).unwrap();
    let outcome = client.send("+46701234567", "Hello", None).await;

    assert_eq!(outcome.status, DeliveryStatus::Error);
    assert!(
        outcome
            .error
            .as_deref()
            .is_some_and(|e| e.starts_with("Invalid provider response"))
    );
}

#[tokio::test]
async fn timeouts_are_retried_then_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": "late"}))
                .set_delay(Duration::from_millis(500)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let mut config = test_config(&server);
    config.provider.timeout = Duration::from_millis(100);
    config.retry.max_retries = 1;

    let client = DeliveryClient::new(&config).unwrap();
    let outcome = client.send("+46701234567", "Hello", None).await;

    assert_eq!(outcome.status, DeliveryStatus::Error);
    assert!(outcome.error.as_deref().is_some_and(|e| e.contains("timeout")));
}

#[tokio::test]
async fn unreachable_provider_is_error_outcome() {
    let server = MockServer::start().await;
    let mut config = test_config(&server);
    // nothing listens on port 9 of localhost
    config.provider.api_url = "http://127.0.0.1:9/api/v1/sms/send".to_string();
    config.retry.max_retries = 1;

    let client = DeliveryClient::new(&config).unwrap();
    let outcome = client.send("+46701234567", "Hello", None).await;

    assert_eq!(outcome.status, DeliveryStatus::Error);
    assert_eq!(outcome.response, Some(json!({})));
}
