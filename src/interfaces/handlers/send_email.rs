use actix_web::{post, web, HttpRequest, Responder};
use serde::Serialize;

use crate::{
    constants::GENERAL_FORM,
    entities::{
        forms::FormType,
        notification::{DispatchResult, DispatchStatus, NotificationPayload},
    },
    handlers::json_error::dispatch_response,
    utils::client_ip::client_ip,
    AppState,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&DispatchResult> for SendEmailResponse {
    fn from(result: &DispatchResult) -> Self {
        SendEmailResponse {
            success: result.success,
            message_id: result.message_id.clone(),
            error: (!result.success).then(|| result.message.clone()),
        }
    }
}

/// Backend side of the proxy transport: delivers a prepared payload.
///
/// Only the site's own inboxes are accepted as recipients so the endpoint
/// cannot be used as an open relay.
#[post("/sendEmail")]
pub async fn send_email(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Json<NotificationPayload>,
) -> impl Responder {
    let payload = payload.into_inner();

    if !state.dispatcher.recipients.contains(&payload.to_email) {
        tracing::warn!(to = %payload.to_email, "Refused sendEmail request for unknown recipient");
        let result = DispatchResult::failure(DispatchStatus::Invalid, "Recipient is not accepted by this service");
        return dispatch_response(&result, &SendEmailResponse::from(&result));
    }

    let origin = client_ip(&req, state.config.trust_x_forwarded_for);
    // Unknown form names share one bucket so the client cannot mint fresh keys.
    let form = payload
        .metadata
        .form_type
        .as_deref()
        .and_then(|f| f.trim().parse::<FormType>().ok())
        .map_or(GENERAL_FORM, |f| f.as_str());

    let result = state.dispatcher.dispatch(payload, form, origin.as_deref()).await;
    dispatch_response(&result, &SendEmailResponse::from(&result))
}
