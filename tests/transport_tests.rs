mod test_utils;

use std::{net::TcpListener, time::Duration};

use actix_web::{web, App, HttpResponse, HttpServer};
use scritique_backend::{
    entities::notification::{NotificationPayload, PayloadMetadata},
    errors::TransportError,
    mail::{
        proxy::ProxyTransport, relay_api::RelayApiTransport, smtp::SmtpTransport,
        transport::Transport,
    },
    settings::{AppConfig, RelayApiSettings},
};
use serde_json::json;
use test_utils::{RecordingTransport, TestApp};

fn payload() -> NotificationPayload {
    NotificationPayload {
        to_email: "info@scritique.com".to_string(),
        subject: "New Contact Form Submission - Scritique".to_string(),
        body: "Name: A\nEmail: a@x.com".to_string(),
        metadata: PayloadMetadata {
            from_name: Some("A".to_string()),
            from_email: Some("a@x.com".to_string()),
            form_type: Some("contact".to_string()),
            ..PayloadMetadata::default()
        },
    }
}

/// Serves `routes` on an ephemeral port and returns its base URL.
async fn spawn_stub(routes: fn(&mut web::ServiceConfig)) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = HttpServer::new(move || App::new().configure(routes))
        .listen(listener)
        .unwrap()
        .workers(1)
        .run();
    tokio::spawn(server);

    format!("http://127.0.0.1:{}", port)
}

fn backend_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/ok/sendEmail",
        web::post().to(|body: web::Json<serde_json::Value>| async move {
            if body["to_email"] == "info@scritique.com" && body["message"].is_string() {
                HttpResponse::Ok().json(json!({ "success": true, "messageId": "<abc@scritique.com>" }))
            } else {
                HttpResponse::BadRequest().json(json!({ "success": false, "error": "bad payload" }))
            }
        }),
    )
    .route(
        "/ok/health",
        web::get().to(|| async { HttpResponse::Ok().json(json!({ "status": "OK" })) }),
    )
    .route(
        "/refusing/sendEmail",
        web::post().to(|| async {
            HttpResponse::Ok().json(json!({ "success": false, "error": "smtp down" }))
        }),
    )
    .route(
        "/broken/sendEmail",
        web::post().to(|| async { HttpResponse::InternalServerError().body("boom") }),
    )
    .route(
        "/slow/sendEmail",
        web::post().to(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            HttpResponse::Ok().json(json!({ "success": true }))
        }),
    );
}

fn relay_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/api/v1.0/email/send",
        web::post().to(|body: web::Json<serde_json::Value>| async move {
            let well_formed = body["service_id"] == "svc"
                && body["template_id"] == "tpl"
                && body["user_id"] == "public"
                && body["accessToken"] == "private"
                && body["template_params"]["subject"] == "New Contact Form Submission - Scritique"
                && body["template_params"]["formType"] == "contact";
            if well_formed {
                HttpResponse::Ok().body("OK")
            } else {
                HttpResponse::BadRequest().body("The service ID is invalid")
            }
        }),
    );
}

fn relay_settings(url: String) -> RelayApiSettings {
    RelayApiSettings {
        url,
        service_id: "svc".to_string(),
        template_id: "tpl".to_string(),
        public_key: "public".to_string(),
        private_key: Some(zeroize::Zeroizing::new("private".to_string())),
    }
}

#[actix_rt::test]
async fn test_smtp_without_credentials_is_not_configured() {
    let transport = SmtpTransport::new(AppConfig::default().smtp(), Duration::from_secs(1));
    let expected = vec![
        "APP_SMTP_HOST".to_string(),
        "APP_SMTP_USER".to_string(),
        "APP_SMTP_PASS".to_string(),
    ];

    assert_eq!(transport.missing_config(), expected);
    assert_eq!(transport.name(), "smtp");
    assert_eq!(transport.send(&payload()).await, Err(TransportError::NotConfigured(expected.clone())));
    assert_eq!(transport.verify().await, Err(TransportError::NotConfigured(expected)));
}

#[actix_rt::test]
async fn test_proxy_returns_backend_message_id() {
    let base = spawn_stub(backend_routes).await;
    let transport = ProxyTransport::new(&format!("{}/ok/", base), Duration::from_secs(5)).unwrap();

    let receipt = transport.send(&payload()).await.unwrap();

    assert_eq!(receipt.message_id.as_deref(), Some("<abc@scritique.com>"));
    assert!(transport.verify().await.is_ok());
}

#[actix_rt::test]
async fn test_proxy_reports_backend_refusal() {
    let base = spawn_stub(backend_routes).await;
    let transport = ProxyTransport::new(&format!("{}/refusing", base), Duration::from_secs(5)).unwrap();

    let err = transport.send(&payload()).await.unwrap_err();

    assert_eq!(err, TransportError::Rejected("smtp down".to_string()));
}

#[actix_rt::test]
async fn test_proxy_treats_error_status_as_failure() {
    let base = spawn_stub(backend_routes).await;
    let transport = ProxyTransport::new(&format!("{}/broken", base), Duration::from_secs(5)).unwrap();

    let err = transport.send(&payload()).await.unwrap_err();

    assert!(matches!(err, TransportError::Rejected(msg) if msg.contains("500")));
}

#[actix_rt::test]
async fn test_proxy_times_out() {
    let base = spawn_stub(backend_routes).await;
    let transport = ProxyTransport::new(&format!("{}/slow", base), Duration::from_millis(200)).unwrap();

    let err = transport.send(&payload()).await.unwrap_err();

    assert_eq!(err, TransportError::Timeout);
}

#[actix_rt::test]
async fn test_proxy_with_invalid_base_url_is_not_configured() {
    let transport = ProxyTransport::new("not a url", Duration::from_secs(1)).unwrap();

    assert_eq!(transport.missing_config(), vec!["APP_API_BASE_URL".to_string()]);
    assert!(matches!(
        transport.send(&payload()).await,
        Err(TransportError::NotConfigured(_))
    ));
}

#[actix_rt::test]
async fn test_proxy_against_own_send_email_endpoint() {
    let recorder = RecordingTransport::new();
    let app = TestApp::spawn(recorder.clone()).await;
    let transport = ProxyTransport::new(&format!("{}/api", app.address), Duration::from_secs(5)).unwrap();

    let receipt = transport.send(&payload()).await.unwrap();

    assert_eq!(receipt.message_id.as_deref(), Some("<test-1@scritique.com>"));
    let sent = recorder.sent.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0], payload());
}

#[actix_rt::test]
async fn test_relay_api_posts_expected_body() {
    let base = spawn_stub(relay_routes).await;
    let transport = RelayApiTransport::new(
        relay_settings(format!("{}/api/v1.0/email/send", base)),
        Duration::from_secs(5),
    )
    .unwrap();

    let receipt = transport.send(&payload()).await.unwrap();

    assert_eq!(receipt.message_id, None);
}

#[actix_rt::test]
async fn test_relay_api_rejection() {
    let base = spawn_stub(relay_routes).await;
    let settings = RelayApiSettings {
        service_id: "other".to_string(),
        ..relay_settings(format!("{}/api/v1.0/email/send", base))
    };
    let transport = RelayApiTransport::new(settings, Duration::from_secs(5)).unwrap();

    let err = transport.send(&payload()).await.unwrap_err();

    assert!(matches!(err, TransportError::Rejected(msg) if msg.contains("service ID")));
}

#[actix_rt::test]
async fn test_relay_api_missing_keys() {
    let settings = RelayApiSettings {
        service_id: String::new(),
        public_key: " ".to_string(),
        ..relay_settings("http://127.0.0.1:9/unused".to_string())
    };
    let transport = RelayApiTransport::new(settings, Duration::from_secs(1)).unwrap();

    assert_eq!(
        transport.missing_config(),
        vec!["APP_RELAY_SERVICE_ID".to_string(), "APP_RELAY_PUBLIC_KEY".to_string()]
    );
    assert!(matches!(
        transport.verify().await,
        Err(TransportError::NotConfigured(_))
    ));
}

#[test]
fn test_html_body_sanitizes_user_values() {
    let mut payload = payload();
    payload.body = "Message:\n<script>alert(1)</script>Tom & Jerry\n1 < 2".to_string();
    payload.metadata.from_name = Some("<b>A</b>".to_string());
    payload.metadata.cover_letter = Some("line one\nline two".to_string());

    let html = scritique_backend::mail::html::render_html(&payload);

    assert!(!html.contains("<script>"));
    assert!(!html.contains("alert(1)"));
    assert!(!html.contains("<b>"));
    assert!(html.contains(">A</td>"));
    assert!(html.contains("Message:<br>Tom &amp; Jerry<br>1 &lt; 2"));
    assert!(html.contains("<p>line one<br>line two</p>"));
    assert!(!html.contains("&#32;"));
}
