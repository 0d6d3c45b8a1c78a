use async_trait::async_trait;

use crate::{
    entities::notification::{DeliveryReceipt, NotificationPayload},
    errors::TransportError,
};

/// Delivers a notification. Implementations never panic past this boundary;
/// every failure comes back as a [`TransportError`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, payload: &NotificationPayload) -> Result<DeliveryReceipt, TransportError>;

    /// Checks that the far end is reachable and accepts our credentials.
    async fn verify(&self) -> Result<(), TransportError>;

    /// Names of required settings that are missing. Empty when configured.
    fn missing_config(&self) -> Vec<String>;

    fn name(&self) -> &'static str;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn send(&self, payload: &NotificationPayload) -> Result<DeliveryReceipt, TransportError> {
        (**self).send(payload).await
    }

    async fn verify(&self) -> Result<(), TransportError> {
        (**self).verify().await
    }

    fn missing_config(&self) -> Vec<String> {
        (**self).missing_config()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
