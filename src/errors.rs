use std::fmt;

use actix_web::{
    error::ResponseError,
    http::{header::{self, ContentType}, StatusCode},
    HttpResponse
};
use derive_more::Display;
use serde::Serialize;
use validator::ValidationErrors;

pub const VALIDATION_MESSAGE: &str = "Missing required fields. Please check your input and try again.";
pub const TRANSPORT_MESSAGE: &str = "Failed to send email. Please try again later or contact us directly.";
pub const INTERNAL_MESSAGE: &str = "An unexpected error occurred. Please try again later.";

#[derive(Debug)]
pub enum AppError {
    ValidationError(Vec<FieldError>),
    RateLimited { message: String, retry_after_secs: u64 },
    TransportError(String),
    ConfigurationError(Vec<String>),
    NotFound(String),
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ValidationError(errors) => {
                let messages = errors.iter()
                    .map(|e| format!("{}:{}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "validation error: {}", messages)
            }
            AppError::RateLimited { message, .. } => write!(f, "Rate limited: {}", message),
            AppError::TransportError(msg) => write!(f, "Transport error: {}", msg),
            AppError::ConfigurationError(vars) => {
                write!(f, "Not configured, missing: {}", vars.join(", "))
            }
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal server error: {}", msg)
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Text that is safe to show an end user. Transport and internal details
    /// stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            AppError::ValidationError(_) => VALIDATION_MESSAGE.to_string(),
            AppError::RateLimited { message, .. } => message.clone(),
            AppError::TransportError(_) | AppError::ConfigurationError(_) => TRANSPORT_MESSAGE.to_string(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::InternalError(_) => INTERNAL_MESSAGE.to_string(),
        }
    }

    pub fn validation(field: &str, message: &str) -> Self {
        AppError::ValidationError(vec![FieldError {
            field: field.to_string(),
            message: message.to_string(),
        }])
    }

    pub fn to_http_response(&self) -> HttpResponse {
        self.error_response()
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::ValidationError(errors) => {
                serde_json::json!({
                    "success": false,
                    "error": VALIDATION_MESSAGE,
                    "details": errors
                })
            }
            _ => {
                serde_json::json!({"success": false, "error": self.user_message()})
            }
        };
        let mut response = HttpResponse::build(self.status_code());
        response.insert_header(ContentType::json());
        if let AppError::RateLimited { retry_after_secs, .. } = self {
            response.insert_header((header::RETRY_AFTER, retry_after_secs.to_string()));
        }
        response.json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::TransportError(_) => StatusCode::BAD_GATEWAY,
            AppError::ConfigurationError(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut field_errors: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(|e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string()),
                })
            })
            .collect();
        field_errors.sort_by(|a, b| a.field.cmp(&b.field));

        AppError::ValidationError(field_errors)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl From<TransportError> for AppError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::NotConfigured(vars) => AppError::ConfigurationError(vars),
            other => AppError::TransportError(other.to_string()),
        }
    }
}

/// Failure of a mail transport. Detail is for logs only.
#[derive(Debug, Display, Clone, PartialEq)]
pub enum TransportError {
    #[display("Transport not configured, missing: {}", _0.join(", "))]
    NotConfigured(Vec<String>),

    #[display("Transport timed out")]
    Timeout,

    #[display("Connection failed: {_0}")]
    Connection(String),

    #[display("Message could not be built: {_0}")]
    InvalidMessage(String),

    #[display("Delivery rejected: {_0}")]
    Rejected(String),
}

impl std::error::Error for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Connection(err.to_string())
        }
    }
}

#[derive(Debug, Display)]
pub enum StoreError {
    #[display("Rate limit store unavailable: {_0}")]
    Unavailable(String),

    #[display("Rate limit record corrupted: {_0}")]
    Corrupted(String),
}

impl std::error::Error for StoreError {}

#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}
