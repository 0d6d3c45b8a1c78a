use actix_web::{middleware::NormalizePath, web, App, HttpServer};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use reqwest::Client;
use scritique_backend::{
    entities::notification::{DeliveryReceipt, NotificationPayload},
    errors::TransportError,
    limiter::store::InMemoryRateLimitStore,
    mail::transport::Transport,
    routes::configure_routes,
    settings::{AppConfig, AppEnvironment},
    AppState,
};
use std::{net::TcpListener, sync::Arc, time::Duration};

pub struct TestApp {
    pub state: web::Data<AppState>,
    pub address: String,
    pub client: Client,
}

impl TestApp {
    /// Spawns the service with a test transport and an in-memory store.
    pub async fn spawn(transport: RecordingTransport) -> Self {
        let config = test_config();
        let state = AppState::with_parts(
            &config,
            Box::new(transport),
            Box::new(InMemoryRateLimitStore::new()),
        );
        Self::spawn_with_state(state).await
    }

    pub async fn spawn_with_state(state: AppState) -> Self {
        let state = web::Data::new(state);

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let server_state = state.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(server_state.clone())
                .wrap(NormalizePath::trim())
                .configure(configure_routes)
        })
        .listen(listener)
        .expect("Failed to bind server")
        .workers(1)
        .run();

        tokio::spawn(server);

        let client = Client::new();
        while client.get(format!("{}/api/health", address)).send().await.is_err() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        Self {
            state,
            address,
            client,
        }
    }

    pub async fn post_form(&self, form: &str, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/api/v1/forms/{}", self.address, form))
            .json(body)
            .send()
            .await
            .expect("Failed to submit form")
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        env: AppEnvironment::Testing,
        name: "Scritique Mailer Test".to_string(),
        port: 0,
        worker_count: 1,
        ..AppConfig::default()
    }
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap()
}

/// Transport that keeps every payload it is asked to send.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    pub sent: Arc<Mutex<Vec<NotificationPayload>>>,
    pub fail_with: Option<TransportError>,
    pub delay: Option<Duration>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: TransportError) -> Self {
        RecordingTransport {
            fail_with: Some(error),
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        RecordingTransport {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, payload: &NotificationPayload) -> Result<DeliveryReceipt, TransportError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        let mut sent = self.sent.lock();
        sent.push(payload.clone());
        Ok(DeliveryReceipt {
            message_id: Some(format!("<test-{}@scritique.com>", sent.len())),
        })
    }

    async fn verify(&self) -> Result<(), TransportError> {
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn missing_config(&self) -> Vec<String> {
        Vec::new()
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

pub fn contact_body() -> serde_json::Value {
    serde_json::json!({
        "name": "A",
        "email": "a@x.com",
        "message": "hi"
    })
}
