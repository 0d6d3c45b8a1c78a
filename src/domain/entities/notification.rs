use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

pub const NOT_PROVIDED: &str = "Not provided";
pub const NOT_SPECIFIED: &str = "Not specified";

/// Rejects empty and whitespace-only strings.
pub fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// A normalized notification ready for a transport.
///
/// The serialized shape is the `POST /api/sendEmail` request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct NotificationPayload {
    #[validate(
        custom(function = "non_blank", message = "Recipient is required"),
        email(message = "Recipient must be an email address")
    )]
    pub to_email: String,

    #[validate(custom(function = "non_blank", message = "Subject is required"))]
    pub subject: String,

    #[serde(rename = "message")]
    #[validate(custom(function = "non_blank", message = "Message body is required"))]
    pub body: String,

    #[serde(flatten)]
    pub metadata: PayloadMetadata,
}

/// Optional fields carried next to the body. Transports that render HTML
/// show them as a summary block.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PayloadMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_title: Option<String>,
    #[serde(rename = "formType", default, skip_serializing_if = "Option::is_none")]
    pub form_type: Option<String>,
}

impl PayloadMetadata {
    /// Labelled metadata values in display order, skipping absent ones.
    pub fn labelled(&self) -> Vec<(&'static str, &str)> {
        [
            ("Name", &self.from_name),
            ("Email", &self.from_email),
            ("Phone", &self.phone),
            ("Service", &self.service),
            ("Industry", &self.industry),
            ("Experience", &self.experience),
            ("Position", &self.role_title),
            ("Resume", &self.resume),
        ]
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .map(|v| (label, v))
        })
        .collect()
    }
}

/// What a transport hands back after a confirmed delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub message_id: Option<String>,
}

/// Classifies a dispatch outcome. Not part of the JSON body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStatus {
    Sent,
    Invalid,
    RateLimited,
    Failed,
    Internal,
}

/// The only shape the dispatch path returns to callers.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
    pub success: bool,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    /// Seconds until the submitter may try again, set on rate-limit denials.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,

    #[serde(skip)]
    pub status: DispatchStatus,
}

impl DispatchResult {
    pub fn sent(receipt: DeliveryReceipt) -> Self {
        DispatchResult {
            success: true,
            message: "Email sent successfully".to_string(),
            message_id: receipt.message_id,
            retry_after: None,
            status: DispatchStatus::Sent,
        }
    }

    pub fn failure(status: DispatchStatus, message: impl Into<String>) -> Self {
        DispatchResult {
            success: false,
            message: message.into(),
            message_id: None,
            retry_after: None,
            status,
        }
    }

    pub fn rate_limited(message: impl Into<String>, retry_after: u64) -> Self {
        DispatchResult {
            retry_after: Some(retry_after),
            ..DispatchResult::failure(DispatchStatus::RateLimited, message)
        }
    }
}
