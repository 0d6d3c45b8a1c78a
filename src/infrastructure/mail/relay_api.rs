use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::{
    entities::notification::{DeliveryReceipt, NotificationPayload},
    errors::TransportError,
    mail::transport::Transport,
    settings::RelayApiSettings,
};

#[derive(Serialize)]
struct RelayRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
    template_params: &'a NotificationPayload,
}

/// Hands the payload to a third-party transactional email API
/// (EmailJS-compatible request body).
pub struct RelayApiTransport {
    settings: RelayApiSettings,
    client: Client,
}

impl RelayApiTransport {
    pub fn new(settings: RelayApiSettings, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        Ok(RelayApiTransport { settings, client })
    }
}

#[async_trait]
impl Transport for RelayApiTransport {
    async fn send(&self, payload: &NotificationPayload) -> Result<DeliveryReceipt, TransportError> {
        let missing = self.missing_config();
        if !missing.is_empty() {
            return Err(TransportError::NotConfigured(missing));
        }

        let request = RelayRequest {
            service_id: &self.settings.service_id,
            template_id: &self.settings.template_id,
            user_id: &self.settings.public_key,
            access_token: self.settings.private_key.as_ref().map(|k| k.as_str()),
            template_params: payload,
        };

        let response = self.client
            .post(&self.settings.url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Rejected(format!("{}: {}", status, body.trim())));
        }

        tracing::info!(
            to = %payload.to_email,
            subject = %payload.subject,
            "Email accepted by relay API"
        );

        Ok(DeliveryReceipt::default())
    }

    async fn verify(&self) -> Result<(), TransportError> {
        let missing = self.missing_config();
        if !missing.is_empty() {
            return Err(TransportError::NotConfigured(missing));
        }
        // The relay has no status endpoint; reaching the host is the best we can do.
        self.client.head(&self.settings.url).send().await?;
        Ok(())
    }

    fn missing_config(&self) -> Vec<String> {
        self.settings.missing_vars()
    }

    fn name(&self) -> &'static str {
        "relay_api"
    }
}
