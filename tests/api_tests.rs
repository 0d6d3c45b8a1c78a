mod test_utils;

use reqwest::StatusCode;
use scritique_backend::{
    errors::{TransportError, TRANSPORT_MESSAGE, VALIDATION_MESSAGE},
    settings::{AppConfig, TransportKind},
    AppState,
};
use serde_json::{json, Value};
use test_utils::{contact_body, test_config, RecordingTransport, TestApp};

#[actix_rt::test]
async fn test_home_banner() {
    let app = TestApp::spawn(RecordingTransport::new()).await;

    let response = app.client.get(&app.address).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_health_reports_missing_smtp_settings() {
    let state = AppState::new(&test_config()).unwrap();
    let app = TestApp::spawn_with_state(state).await;

    let response = app
        .client
        .get(format!("{}/api/health", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "Not configured");
    assert_eq!(body["configured"], false);
    assert_eq!(body["transport"], "smtp");
    assert_eq!(
        body["missingVars"],
        json!(["APP_SMTP_HOST", "APP_SMTP_USER", "APP_SMTP_PASS"])
    );
}

#[actix_rt::test]
async fn test_health_ok_when_transport_configured() {
    let app = TestApp::spawn(RecordingTransport::new()).await;

    let response = app
        .client
        .get(format!("{}/api/health", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "OK");
    assert_eq!(body["configured"], true);
    assert_eq!(body["missingVars"], json!([]));
}

#[actix_rt::test]
async fn test_transport_check_reports_failure() {
    let app = TestApp::spawn(RecordingTransport::failing(TransportError::Connection(
        "connection refused".to_string(),
    )))
    .await;

    let response = app
        .client
        .get(format!("{}/api/health/transport", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[actix_rt::test]
async fn test_contact_form_is_delivered() {
    let transport = RecordingTransport::new();
    let app = TestApp::spawn(transport.clone()).await;

    let response = app.post_form("contact", &contact_body()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Email sent successfully");
    assert_eq!(body["messageId"], "<test-1@scritique.com>");

    let sent = transport.sent.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to_email, "contact@scritique.com");
    assert_eq!(sent[0].subject, "New Contact Form Submission - Scritique");
}

#[actix_rt::test]
async fn test_job_application_route() {
    let transport = RecordingTransport::new();
    let app = TestApp::spawn(transport.clone()).await;

    let response = app
        .post_form(
            "job-application",
            &json!({
                "firstName": "Grace",
                "lastName": "Hopper",
                "email": "grace@example.com",
                "coverLetter": "Hello",
                "resume": false,
                "roleTitle": "Editor"
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(transport.sent.lock()[0].subject, "Job Application - Editor - Scritique");
}

#[actix_rt::test]
async fn test_invalid_form_returns_bad_request() {
    let transport = RecordingTransport::new();
    let app = TestApp::spawn(transport.clone()).await;

    let response = app
        .post_form("expert", &json!({
            "firstName": "Ada",
            "lastName": "",
            "email": "ada@example.com",
            "phone": "123",
            "message": "hi"
        }))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], VALIDATION_MESSAGE);
    assert_eq!(transport.sent_count(), 0);
}

#[actix_rt::test]
async fn test_second_submission_within_cooldown_is_rate_limited() {
    let transport = RecordingTransport::new();
    let app = TestApp::spawn(transport.clone()).await;

    let first = app.post_form("contact", &contact_body()).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.post_form("contact", &contact_body()).await;

    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = second
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap();
    assert!(retry_after > 0 && retry_after <= 60);

    let body: Value = second.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["retryAfter"], retry_after);
    assert!(body["message"].as_str().unwrap().starts_with("Please wait "));
    assert_eq!(transport.sent_count(), 1);
}

#[actix_rt::test]
async fn test_transport_failure_returns_bad_gateway() {
    let app = TestApp::spawn(RecordingTransport::failing(TransportError::Timeout)).await;

    let response = app.post_form("contact-popup", &contact_body()).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], TRANSPORT_MESSAGE);
}

#[actix_rt::test]
async fn test_malformed_json_returns_bad_request() {
    let app = TestApp::spawn(RecordingTransport::new()).await;

    let response = app
        .client
        .post(format!("{}/api/v1/forms/contact", app.address))
        .header("content-type", "application/json")
        .body("{\"name\": ")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[actix_rt::test]
async fn test_rate_limit_status_endpoint() {
    let app = TestApp::spawn(RecordingTransport::new()).await;
    app.post_form("contact", &contact_body()).await;

    let response = app
        .client
        .get(format!("{}/api/v1/forms/contact/rate-limit?email=A@X.com", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["hourlyRemaining"], 4);
    assert_eq!(body["dailyRemaining"], 19);
    assert!(body["cooldownRemaining"].as_u64().unwrap() > 0);

    let other_form = app
        .client
        .get(format!("{}/api/v1/forms/expert/rate-limit?email=a@x.com", app.address))
        .send()
        .await
        .unwrap();
    let body: Value = other_form.json().await.unwrap();
    assert_eq!(body["hourlyRemaining"], 5);
}

#[actix_rt::test]
async fn test_rate_limit_status_for_unknown_form() {
    let app = TestApp::spawn(RecordingTransport::new()).await;

    let response = app
        .client
        .get(format!("{}/api/v1/forms/newsletter/rate-limit", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Unknown form type: newsletter");
}

#[actix_rt::test]
async fn test_send_email_delivers_to_known_recipient() {
    let transport = RecordingTransport::new();
    let app = TestApp::spawn(transport.clone()).await;

    let response = app
        .client
        .post(format!("{}/api/sendEmail", app.address))
        .json(&json!({
            "to_email": "expert@scritique.com",
            "subject": "New Expert Consultation Request - Scritique",
            "message": "Name: Ada Lovelace",
            "from_email": "ada@example.com",
            "formType": "expert"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["messageId"], "<test-1@scritique.com>");
    assert!(body.get("error").is_none());
    assert_eq!(transport.sent.lock()[0].metadata.from_email.as_deref(), Some("ada@example.com"));
}

#[actix_rt::test]
async fn test_send_email_refuses_unknown_recipient() {
    let transport = RecordingTransport::new();
    let app = TestApp::spawn(transport.clone()).await;

    let response = app
        .client
        .post(format!("{}/api/sendEmail", app.address))
        .json(&json!({
            "to_email": "someone@elsewhere.com",
            "subject": "Hello",
            "message": "Buy now"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Recipient is not accepted by this service");
    assert_eq!(transport.sent_count(), 0);
}

#[actix_rt::test]
async fn test_unknown_path_returns_json_not_found() {
    let app = TestApp::spawn(RecordingTransport::new()).await;

    let response = app
        .client
        .get(format!("{}/api/v2/anything", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["details"], "/api/v2/anything");
}

#[actix_rt::test]
async fn test_send_email_form_type_cannot_reset_quota() {
    let transport = RecordingTransport::new();
    let app = TestApp::spawn(transport.clone()).await;

    let send = |form_type: &'static str| {
        app.client
            .post(format!("{}/api/sendEmail", app.address))
            .json(&json!({
                "to_email": "info@scritique.com",
                "subject": "Hello",
                "message": "Hi there",
                "from_email": "a@x.com",
                "formType": form_type
            }))
            .send()
    };

    let first = send("x1").await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = send("x2").await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(second.headers().get("retry-after").is_some());
    assert_eq!(transport.sent_count(), 1);
}

#[actix_rt::test]
async fn test_send_email_known_form_type_shares_form_quota() {
    let app = TestApp::spawn(RecordingTransport::new()).await;

    let response = app
        .client
        .post(format!("{}/api/sendEmail", app.address))
        .json(&json!({
            "to_email": "contact@scritique.com",
            "subject": "New Contact Form Submission - Scritique",
            "message": "Name: A",
            "from_email": "a@x.com",
            "formType": "contact"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let form = app.post_form("contact", &contact_body()).await;
    assert_eq!(form.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[actix_rt::test]
async fn test_proxy_without_base_url_reports_not_configured() {
    let config = AppConfig {
        transport: TransportKind::Proxy,
        ..test_config()
    };
    let app = TestApp::spawn_with_state(AppState::new(&config).unwrap()).await;

    let response = app
        .client
        .get(format!("{}/api/health", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["transport"], "proxy");
    assert_eq!(body["missingVars"], json!(["APP_API_BASE_URL"]));

    let submit = app.post_form("contact", &contact_body()).await;
    assert_eq!(submit.status(), StatusCode::BAD_GATEWAY);
}
