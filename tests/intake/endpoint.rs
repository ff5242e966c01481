use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use concierge::{
    config::IntakeConfig,
    intake::{IntakeGateway, RelayError, RelayPayload, RelayPort},
    server::{AppState, router},
};
use serde_json::{Value, json};

struct CountingRelay {
    calls: Arc<AtomicUsize>,
    outcome: Result<(), RelayError>,
}

#[async_trait]
impl RelayPort for CountingRelay {
    async fn deliver(&self, _payload: &RelayPayload) -> Result<(), RelayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

/// Serves the real router on an ephemeral loopback port and returns its base
/// URL. The serve task is detached; it dies with the test runtime.
async fn serve(gateway: IntakeGateway) -> String {
    let state = AppState {
        gateway: Arc::new(gateway),
    };
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("ephemeral port should bind");
    let addr = listener.local_addr().expect("bound address should be readable");
    tokio::spawn(async move {
        axum::serve(
            listener,
            router(state).into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("test server should run");
    });
    format!("http://{addr}")
}

fn qualified_body() -> Value {
    json!({
        "fullName": "Jane Doe",
        "email": "jane.doe@clinic.example",
        "organization": "Mercy Clinic",
        "role": "CTO",
        "organizationType": "Hospital",
        "useCase": "Triage assistant for intake calls",
        "deploymentPreference": "On premises",
        "timeline": "Q4 2026",
        "complianceRequirements": "HIPAA and SOC 2",
        "consentAccepted": true,
        "website": ""
    })
}

#[tokio::test]
async fn given_valid_submission_when_no_relay_configured_then_200_with_manual_routing() {
    let base = serve(IntakeGateway::new(&IntakeConfig::default())).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/contact"))
        .json(&qualified_body())
        .send()
        .await
        .expect("request should complete");

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.expect("body should be json");
    assert_eq!(body["relayStatus"], "manual");
    assert!(
        body["mailtoUrl"]
            .as_str()
            .is_some_and(|url| url.starts_with("mailto:")),
        "{body}"
    );
    assert!(
        body["message"].as_str().is_some_and(|m| !m.is_empty()),
        "{body}"
    );
}

#[tokio::test]
async fn given_relay_outage_when_submitting_then_still_200_with_manual_routing() {
    let calls = Arc::new(AtomicUsize::new(0));
    let relay = Arc::new(CountingRelay {
        calls: Arc::clone(&calls),
        outcome: Err(RelayError::Status(502)),
    });
    let gateway = IntakeGateway::new(&IntakeConfig::default()).with_relay(relay);
    let base = serve(gateway).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/contact"))
        .json(&qualified_body())
        .send()
        .await
        .expect("request should complete");

    assert_eq!(response.status().as_u16(), 200, "relay outage never becomes a 5xx");
    let body: Value = response.json().await.expect("body should be json");
    assert_eq!(body["relayStatus"], "manual");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn given_get_on_contact_route_then_405_with_allow_header() {
    let base = serve(IntakeGateway::new(&IntakeConfig::default())).await;

    let response = reqwest::Client::new()
        .get(format!("{base}/api/contact"))
        .send()
        .await
        .expect("request should complete");

    assert_eq!(response.status().as_u16(), 405);
    let allow = response
        .headers()
        .get("allow")
        .and_then(|value| value.to_str().ok())
        .expect("allow header present")
        .to_string();
    assert!(allow.contains("POST"), "unexpected Allow header: {allow}");
    let body: Value = response.json().await.expect("body should be json");
    assert_eq!(body["error"], "Method not allowed.");
}

#[tokio::test]
async fn given_unreadable_body_when_posting_then_400_invalid_body() {
    let base = serve(IntakeGateway::new(&IntakeConfig::default())).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/contact"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("request should complete");

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.expect("body should be json");
    assert_eq!(body["error"], "Invalid request body.");
}

#[tokio::test]
async fn given_incomplete_submission_when_posting_then_400_missing_fields() {
    let base = serve(IntakeGateway::new(&IntakeConfig::default())).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/contact"))
        .json(&json!({ "email": "not-an-email" }))
        .send()
        .await
        .expect("request should complete");

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.expect("body should be json");
    assert_eq!(body["error"], "Missing required fields.");
}

#[tokio::test]
async fn given_bad_email_when_posting_complete_submission_then_400_invalid_email() {
    let base = serve(IntakeGateway::new(&IntakeConfig::default())).await;

    let mut body = qualified_body();
    body["email"] = json!("jane[at]clinic.example");

    let response = reqwest::Client::new()
        .post(format!("{base}/api/contact"))
        .json(&body)
        .send()
        .await
        .expect("request should complete");

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.expect("body should be json");
    assert_eq!(body["error"], "Invalid email format.");
}

#[tokio::test]
async fn given_filled_honeypot_when_posting_then_200_without_routing_fields() {
    let calls = Arc::new(AtomicUsize::new(0));
    let relay = Arc::new(CountingRelay {
        calls: Arc::clone(&calls),
        outcome: Ok(()),
    });
    let gateway = IntakeGateway::new(&IntakeConfig::default()).with_relay(relay);
    let base = serve(gateway).await;

    let mut body = qualified_body();
    body["website"] = json!("https://spam.example");

    let response = reqwest::Client::new()
        .post(format!("{base}/api/contact"))
        .json(&body)
        .send()
        .await
        .expect("request should complete");

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.expect("body should be json");
    assert_eq!(body["message"], "Request accepted.");
    assert!(body.get("relayStatus").is_none(), "{body}");
    assert!(body.get("mailtoUrl").is_none(), "{body}");
    assert_eq!(calls.load(Ordering::SeqCst), 0, "no relay for trapped bots");
}

#[tokio::test]
async fn given_forwarded_identity_over_ceiling_when_posting_then_429_and_other_identity_passes() {
    let config = IntakeConfig {
        rate_max_requests: 1,
        ..IntakeConfig::default()
    };
    let base = serve(IntakeGateway::new(&config)).await;
    let client = reqwest::Client::new();

    let first = client
        .post(format!("{base}/api/contact"))
        .header("x-forwarded-for", "203.0.113.5")
        .json(&qualified_body())
        .send()
        .await
        .expect("request should complete");
    assert_eq!(first.status().as_u16(), 200);

    let second = client
        .post(format!("{base}/api/contact"))
        .header("x-forwarded-for", "203.0.113.5")
        .json(&qualified_body())
        .send()
        .await
        .expect("request should complete");
    assert_eq!(second.status().as_u16(), 429);
    let body: Value = second.json().await.expect("body should be json");
    assert_eq!(body["error"], "Too many requests. Please retry later.");

    let other = client
        .post(format!("{base}/api/contact"))
        .header("x-forwarded-for", "198.51.100.9")
        .json(&qualified_body())
        .send()
        .await
        .expect("request should complete");
    assert_eq!(other.status().as_u16(), 200, "other identities are unaffected");
}

#[tokio::test]
async fn given_host_id_probe_when_getting_then_200_with_identifier() {
    let base = serve(IntakeGateway::new(&IntakeConfig::default())).await;

    let response = reqwest::Client::new()
        .get(format!("{base}/api/host-id"))
        .send()
        .await
        .expect("request should complete");

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.expect("body should be json");
    assert!(
        body["hostId"].as_str().is_some_and(|id| !id.is_empty()),
        "{body}"
    );
}
