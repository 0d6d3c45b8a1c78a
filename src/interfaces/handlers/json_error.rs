use actix_web::{
    http::{header, StatusCode},
    HttpRequest, HttpResponse,
};

use crate::entities::notification::{DispatchResult, DispatchStatus};

pub fn json_error(status: StatusCode, error: &str, details: &str) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({
        "success": false,
        "error": error,
        "details": details
    }))
}

/// Fallback for paths no route matches.
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    json_error(StatusCode::NOT_FOUND, "Not found", req.path())
}

pub fn dispatch_status_code(status: DispatchStatus) -> StatusCode {
    match status {
        DispatchStatus::Sent => StatusCode::OK,
        DispatchStatus::Invalid => StatusCode::BAD_REQUEST,
        DispatchStatus::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        DispatchStatus::Failed => StatusCode::BAD_GATEWAY,
        DispatchStatus::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Builds the HTTP response for a dispatch outcome, adding `Retry-After`
/// on rate-limit denials.
pub fn dispatch_response<B: serde::Serialize>(result: &DispatchResult, body: &B) -> HttpResponse {
    let mut response = HttpResponse::build(dispatch_status_code(result.status));
    if let Some(retry_after) = result.retry_after {
        response.insert_header((header::RETRY_AFTER, retry_after.to_string()));
    }
    response.json(body)
}
