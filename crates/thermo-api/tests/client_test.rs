#![allow(clippy::unwrap_used)]
// Integration tests for `ThermostatClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use thermo_api::{Error, PidParams, ThermostatClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ThermostatClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = ThermostatClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

// ── Mode ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_set_mode_sends_wire_token() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/mode"))
        .and(body_json(json!({ "mode": "pid" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "mode": "pid" })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = client.set_mode("pid").await.unwrap();
    assert_eq!(ack.mode.as_deref(), Some("pid"));
}

#[tokio::test]
async fn test_set_mode_rejected_uses_error_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/mode"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "Invalid mode" })),
        )
        .mount(&server)
        .await;

    let result = client.set_mode("turbo").await;
    match result {
        Err(Error::Api { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid mode");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_without_json_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/mode"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>boom</html>"))
        .mount(&server)
        .await;

    let err = client.set_mode("auto").await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(err.is_transient());
    assert!(
        err.to_string().contains("HTTP 500"),
        "unexpected message: {err}"
    );
}

#[tokio::test]
async fn test_empty_success_body_is_accepted() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/mode"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let ack = client.set_mode("manual").await.unwrap();
    assert!(ack.mode.is_none());
}

// ── Fan and PID ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_set_manual_speed() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/manual_speed"))
        .and(body_json(json!({ "speed": 2 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "fan_speed": 2 })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = client.set_manual_speed(2).await.unwrap();
    assert_eq!(ack.fan_speed, Some(2));
}

#[tokio::test]
async fn test_set_pid_params_posts_all_fields() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/pid_params"))
        .and(body_json(json!({
            "kp": 2.0, "ki": 0.5, "kd": 0.05, "target_temp": 24.0
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let params = PidParams {
        kp: 2.0,
        ki: 0.5,
        kd: 0.05,
        target_temp: 24.0,
    };
    let echo = client.set_pid_params(&params).await.unwrap();
    assert_eq!(echo["status"], "ok");
}

// ── History ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_recent_temperatures() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/influx/temperature"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "time": "Tue, 15 Oct 2024 10:00:00 GMT", "value": 21.5 },
            { "time": "2024-10-15T10:00:05Z", "value": 21.75 }
        ])))
        .mount(&server)
        .await;

    let samples = client.recent_temperatures().await.unwrap();
    assert_eq!(samples.len(), 2);
    assert!((samples[1].value - 21.75).abs() < f64::EPSILON);
    assert!(samples[0].time < samples[1].time);
}

#[tokio::test]
async fn test_history_garbage_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/influx/temperature"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = client.recent_temperatures().await;
    assert!(
        matches!(result, Err(Error::Deserialization { ref body, .. }) if body == "not json"),
        "expected Deserialization error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_base_url_with_trailing_path() {
    let server = MockServer::start().await;
    let base_url = Url::parse(&format!("{}/api/", server.uri())).unwrap();
    let client = ThermostatClient::with_client(reqwest::Client::new(), base_url);

    Mock::given(method("POST"))
        .and(path("/api/mode"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "mode": "auto" })))
        .expect(1)
        .mount(&server)
        .await;

    client.set_mode("auto").await.unwrap();
}
