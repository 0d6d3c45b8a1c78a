use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    entities::notification::{DeliveryReceipt, NotificationPayload},
    errors::TransportError,
    mail::transport::Transport,
};

/// Response body of `POST {base}/sendEmail`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub success: bool,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Forwards the payload to a backend that performs the SMTP send.
pub struct ProxyTransport {
    base_url: String,
    client: Client,
}

impl ProxyTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        Ok(ProxyTransport {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for ProxyTransport {
    async fn send(&self, payload: &NotificationPayload) -> Result<DeliveryReceipt, TransportError> {
        let missing = self.missing_config();
        if !missing.is_empty() {
            return Err(TransportError::NotConfigured(missing));
        }

        let response = self.client
            .post(self.endpoint("sendEmail"))
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(TransportError::Rejected(format!("{}: {}", status, body.trim())));
        }

        let result: ProxyResponse = serde_json::from_str(&body)
            .map_err(|e| TransportError::Rejected(format!("unreadable response: {}", e)))?;

        if !result.success {
            return Err(TransportError::Rejected(
                result.error.unwrap_or_else(|| "backend reported failure".to_string()),
            ));
        }

        tracing::info!(
            to = %payload.to_email,
            subject = %payload.subject,
            message_id = ?result.message_id,
            "Email accepted by backend proxy"
        );

        Ok(DeliveryReceipt {
            message_id: result.message_id,
        })
    }

    async fn verify(&self) -> Result<(), TransportError> {
        let missing = self.missing_config();
        if !missing.is_empty() {
            return Err(TransportError::NotConfigured(missing));
        }

        let response = self.client.get(self.endpoint("health")).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(TransportError::Connection(format!(
                "backend health check returned {}",
                response.status()
            )))
        }
    }

    fn missing_config(&self) -> Vec<String> {
        if url::Url::parse(&self.base_url).is_ok() {
            Vec::new()
        } else {
            vec!["APP_API_BASE_URL".to_string()]
        }
    }

    fn name(&self) -> &'static str {
        "proxy"
    }
}
