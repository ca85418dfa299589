#![allow(clippy::unwrap_used)]
// `LokiClient` as a `Gateway`, against a wiremock backend.

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lokiwatch_api::{LokiClient, TransportConfig};
use lokiwatch_core::{AlertDraft, AlertKind, CoreError, Draft, Gateway, Record, RecordKey};

async fn setup() -> (MockServer, LokiClient) {
    let server = MockServer::start().await;
    let client = LokiClient::new(&server.uri(), &TransportConfig::default()).unwrap();
    (server, client)
}

fn draft(message: &str) -> AlertDraft {
    AlertDraft {
        timestamp: Some(Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()),
        kind: AlertKind::Signature,
        subtype: None,
        pattern: Some("SQL Injection".into()),
        status: None,
        src_ip: "192.168.1.50".into(),
        src_port: None,
        dst_ip: None,
        dst_port: Some(80),
        message: message.into(),
        severity: Some("high".into()),
    }
}

fn stored(id: i64, message: &str) -> serde_json::Value {
    json!({
        "id": id,
        "timestamp": "2025-03-01T10:00:00",
        "type": "SIGNATURE",
        "pattern": "SQL Injection",
        "src_ip": "192.168.1.50",
        "dst_port": 80,
        "message": message,
        "severity": "high"
    })
}

#[tokio::test]
async fn create_alert_posts_wire_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/alerts"))
        .and(body_partial_json(json!({
            "timestamp": "2025-03-01T10:00:00",
            "type": "SIGNATURE",
            "src_ip": "192.168.1.50",
            "dst_port": 80,
            "message": "UNION SELECT in payload"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(stored(31, "UNION SELECT in payload")))
        .expect(1)
        .mount(&server)
        .await;

    let record = client
        .create(Draft::Alert(draft("UNION SELECT in payload")))
        .await
        .unwrap();
    let Record::Alert(alert) = record else {
        panic!("expected an alert record");
    };
    assert_eq!(alert.id, 31);
    assert_eq!(alert.kind, AlertKind::Signature);
    assert_eq!(alert.dst_port, Some(80));
}

#[tokio::test]
async fn update_alert_puts_to_its_id() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/alerts/31"))
        .and(body_partial_json(json!({ "message": "confirmed by analyst" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(stored(31, "confirmed by analyst")))
        .expect(1)
        .mount(&server)
        .await;

    let record = client
        .update(&RecordKey::Alert(31), Draft::Alert(draft("confirmed by analyst")))
        .await
        .unwrap();
    let Record::Alert(alert) = record else {
        panic!("expected an alert record");
    };
    assert_eq!(alert.message, "confirmed by analyst");
}

#[tokio::test]
async fn update_of_missing_alert_is_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/alerts/404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Alert not found" })))
        .mount(&server)
        .await;

    let err = client
        .update(&RecordKey::Alert(404), Draft::Alert(draft("gone")))
        .await
        .unwrap_err();
    assert!(
        matches!(err, CoreError::NotFound { ref identifier, .. } if identifier == "Alert not found"),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn invalid_alert_is_rejected_before_sending() {
    let (server, client) = setup().await;

    let mut bad = draft("x");
    bad.src_ip = "not-an-ip".into();
    let err = client.create(Draft::Alert(bad)).await.unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailed { .. }));
    assert!(server.received_requests().await.unwrap().is_empty());
}
