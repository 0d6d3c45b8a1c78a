use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tokio::{sync::OnceCell, time::timeout};
use uuid::Uuid;

use crate::{
    entities::notification::{DeliveryReceipt, NotificationPayload},
    errors::TransportError,
    mail::{html::render_html, transport::Transport},
    settings::SmtpSettings,
};

type Mailer = AsyncSmtpTransport<Tokio1Executor>;

/// Sends through an authenticated SMTP relay.
///
/// The lettre transport is built on first use and kept for the life of the
/// process; its connection pool is shared by concurrent sends.
pub struct SmtpTransport {
    settings: SmtpSettings,
    timeout: Duration,
    mailer: OnceCell<Mailer>,
}

impl SmtpTransport {
    pub fn new(settings: SmtpSettings, timeout: Duration) -> Self {
        SmtpTransport {
            settings,
            timeout,
            mailer: OnceCell::new(),
        }
    }

    async fn mailer(&self) -> Result<&Mailer, TransportError> {
        self.mailer.get_or_try_init(|| async { self.build_mailer() }).await
    }

    fn build_mailer(&self) -> Result<Mailer, TransportError> {
        let missing = self.settings.missing_vars();
        if !missing.is_empty() {
            return Err(TransportError::NotConfigured(missing));
        }

        let builder = if self.settings.secure {
            Mailer::relay(&self.settings.host)
        } else {
            Mailer::starttls_relay(&self.settings.host)
        }
        .map_err(|e| TransportError::Connection(e.to_string()))?;

        let credentials = Credentials::new(
            self.settings.user.clone(),
            self.settings.pass.as_str().to_owned(),
        );

        tracing::debug!(
            host = %self.settings.host,
            port = self.settings.port,
            secure = self.settings.secure,
            "Building SMTP transport"
        );

        Ok(builder
            .port(self.settings.port)
            .credentials(credentials)
            .timeout(Some(self.timeout))
            .build())
    }

    fn build_message(
        &self,
        payload: &NotificationPayload,
        message_id: &str,
    ) -> Result<Message, TransportError> {
        let from: Mailbox = self
            .settings
            .sender()
            .parse()
            .map_err(|e| TransportError::InvalidMessage(format!("sender address: {}", e)))?;
        let to: Mailbox = payload
            .to_email
            .trim()
            .parse()
            .map_err(|e| TransportError::InvalidMessage(format!("recipient address: {}", e)))?;

        let mut builder = Message::builder()
            .from(from)
            .to(to)
            .subject(payload.subject.as_str())
            .message_id(Some(message_id.to_string()));

        // A malformed submitter address just means no Reply-To.
        if let Some(reply_to) = payload
            .metadata
            .from_email
            .as_deref()
            .and_then(|email| email.trim().parse::<Address>().ok())
        {
            builder = builder.reply_to(Mailbox::new(payload.metadata.from_name.clone(), reply_to));
        }

        builder
            .multipart(MultiPart::alternative_plain_html(
                payload.body.clone(),
                render_html(payload),
            ))
            .map_err(|e| TransportError::InvalidMessage(e.to_string()))
    }

    fn message_id(&self) -> String {
        let domain = self
            .settings
            .sender()
            .rsplit_once('@')
            .map(|(_, domain)| domain)
            .filter(|domain| !domain.is_empty())
            .unwrap_or("localhost");
        format!("<{}@{}>", Uuid::new_v4(), domain)
    }
}

#[async_trait]
impl Transport for SmtpTransport {
    async fn send(&self, payload: &NotificationPayload) -> Result<DeliveryReceipt, TransportError> {
        self.verify().await?;

        let mailer = self.mailer().await?;
        let message_id = self.message_id();
        let message = self.build_message(payload, &message_id)?;

        let response = timeout(self.timeout, mailer.send(message))
            .await
            .map_err(|_| TransportError::Timeout)?
            .map_err(|e| TransportError::Rejected(e.to_string()))?;

        tracing::info!(
            to = %payload.to_email,
            subject = %payload.subject,
            code = %response.code(),
            message_id = %message_id,
            "Email accepted by SMTP server"
        );

        Ok(DeliveryReceipt {
            message_id: Some(message_id),
        })
    }

    async fn verify(&self) -> Result<(), TransportError> {
        let mailer = self.mailer().await?;

        match timeout(self.timeout, mailer.test_connection()).await {
            Ok(Ok(true)) => Ok(()),
            Ok(Ok(false)) => Err(TransportError::Connection(
                "SMTP server did not accept the connection".to_string(),
            )),
            Ok(Err(e)) => Err(TransportError::Connection(e.to_string())),
            Err(_) => Err(TransportError::Timeout),
        }
    }

    fn missing_config(&self) -> Vec<String> {
        self.settings.missing_vars()
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}
