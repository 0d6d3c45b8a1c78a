use actix_web::{
    web,
    http::StatusCode,
    ResponseError,
    HttpResponse,
    error::{JsonPayloadError, QueryPayloadError},
};
use serde_json::json;

/// Malformed request bodies and query strings get the same JSON error shape
/// as everything else on the dispatch path.
pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().limit(64 * 1024).error_handler(|err, _req| {
        tracing::debug!(error = %err, "Rejected malformed JSON body");
        RequestError::from(err).into()
    }));
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        RequestError::from(err).into()
    }));
}

#[derive(Debug)]
pub struct RequestError {
    message: String,
    status: StatusCode
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ResponseError for RequestError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status).json(json!({ "success": false, "error": self.message }))
    }
}

impl From<JsonPayloadError> for RequestError {
    fn from(err: JsonPayloadError) -> Self {
        let status = match err {
            JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            JsonPayloadError::ContentType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::BAD_REQUEST,
        };
        RequestError {
            message: format!("Invalid request body: {}", err),
            status,
        }
    }
}

impl From<QueryPayloadError> for RequestError {
    fn from(err: QueryPayloadError) -> Self {
        RequestError {
            message: format!("Invalid query string: {}", err),
            status: StatusCode::BAD_REQUEST,
        }
    }
}
