use chrono::{DateTime, Utc};
use validator::Validate;

use crate::{
    entities::{
        forms::FormSubmission,
        notification::{DeliveryReceipt, DispatchResult, DispatchStatus, NotificationPayload},
        rate_limit::{RateDecision, RateLimitStatus, SubmissionIdentity},
    },
    errors::AppError,
    limiter::{rate_limiter::RateLimiter, store::RateLimitStore},
    mail::transport::Transport,
    settings::{IdentityStrategy, RecipientSettings},
    use_cases::payload::build_payload,
};

/// Takes a submission from form data to a delivered email.
///
/// Per submission: built, rate checked, then either denied or sent; a sent
/// submission is recorded only when the transport confirms delivery.
pub struct DispatchOrchestrator<T, S>
where
    T: Transport,
    S: RateLimitStore,
{
    pub transport: T,
    pub rate_limiter: RateLimiter<S>,
    pub recipients: RecipientSettings,
    pub identity_strategy: IdentityStrategy,
}

impl<T, S> DispatchOrchestrator<T, S>
where
    T: Transport,
    S: RateLimitStore,
{
    pub fn new(
        transport: T,
        rate_limiter: RateLimiter<S>,
        recipients: RecipientSettings,
        identity_strategy: IdentityStrategy,
    ) -> Self {
        DispatchOrchestrator {
            transport,
            rate_limiter,
            recipients,
            identity_strategy,
        }
    }

    pub async fn submit(&self, submission: FormSubmission, origin: Option<&str>) -> DispatchResult {
        self.submit_at(submission, origin, Utc::now()).await
    }

    pub async fn submit_at(
        &self,
        submission: FormSubmission,
        origin: Option<&str>,
        now: DateTime<Utc>,
    ) -> DispatchResult {
        let form_type = submission.form_type();
        let payload = match build_payload(&submission, &self.recipients) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::info!(form = %form_type, error = %e, "Rejected invalid submission");
                return result_from_error(e);
            }
        };

        self.dispatch_at(payload, form_type.as_str(), origin, now).await
    }

    /// Dispatches an already-built payload, as received by the proxy endpoint.
    pub async fn dispatch(
        &self,
        payload: NotificationPayload,
        form: &str,
        origin: Option<&str>,
    ) -> DispatchResult {
        self.dispatch_at(payload, form, origin, Utc::now()).await
    }

    pub async fn dispatch_at(
        &self,
        payload: NotificationPayload,
        form: &str,
        origin: Option<&str>,
        now: DateTime<Utc>,
    ) -> DispatchResult {
        match self.try_dispatch(&payload, form, origin, now).await {
            Ok(receipt) => DispatchResult::sent(receipt),
            Err(e) => result_from_error(e),
        }
    }

    async fn try_dispatch(
        &self,
        payload: &NotificationPayload,
        form: &str,
        origin: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<DeliveryReceipt, AppError> {
        payload.validate()?;

        let identity = self.identity(payload.metadata.from_email.as_deref(), origin, form);
        let key = identity.key();
        let _guard = self.rate_limiter.lock(&identity).await;

        if let RateDecision::Denied(denial) = self.rate_limiter.check(&identity, now).await? {
            tracing::info!(
                identity = %key,
                reason = ?denial.reason,
                retry_after = denial.retry_after_secs,
                "Submission denied by rate limiter"
            );
            return Err(AppError::RateLimited {
                message: denial.message(),
                retry_after_secs: denial.retry_after_secs,
            });
        }
        tracing::debug!(identity = %key, "Submission passed rate check");

        let receipt = self.transport.send(payload).await.map_err(|e| {
            tracing::error!(
                identity = %key,
                transport = self.transport.name(),
                error = %e,
                "Email delivery failed"
            );
            AppError::from(e)
        })?;

        // Delivery already happened; a bookkeeping failure must not turn it into an error.
        if let Err(e) = self.rate_limiter.record(&identity, now).await {
            tracing::warn!(identity = %key, error = %e, "Failed to record submission");
        }
        tracing::info!(identity = %key, transport = self.transport.name(), "Submission delivered");

        Ok(receipt)
    }

    pub async fn rate_limit_status(
        &self,
        sender_email: Option<&str>,
        origin: Option<&str>,
        form: &str,
        now: DateTime<Utc>,
    ) -> Result<RateLimitStatus, AppError> {
        let identity = self.identity(sender_email, origin, form);
        Ok(self.rate_limiter.status(&identity, now).await?)
    }

    fn identity(&self, sender_email: Option<&str>, origin: Option<&str>, form: &str) -> SubmissionIdentity {
        SubmissionIdentity::derive(self.identity_strategy, sender_email, origin, form)
    }
}

fn result_from_error(err: AppError) -> DispatchResult {
    let status = match &err {
        AppError::ValidationError(_) => DispatchStatus::Invalid,
        AppError::RateLimited { message, retry_after_secs } => {
            return DispatchResult::rate_limited(message.clone(), *retry_after_secs);
        }
        AppError::TransportError(_) | AppError::ConfigurationError(_) => DispatchStatus::Failed,
        AppError::NotFound(_) | AppError::InternalError(_) => {
            tracing::error!(error = %err, "Dispatch failed unexpectedly");
            DispatchStatus::Internal
        }
    };
    DispatchResult::failure(status, err.user_message())
}
