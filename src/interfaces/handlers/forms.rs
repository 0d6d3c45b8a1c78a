use actix_web::{web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use serde::Deserialize;

use crate::{
    entities::forms::{ContactForm, ExpertForm, FormSubmission, FormType, JobApplicationForm},
    errors::AppError,
    handlers::json_error::dispatch_response,
    utils::client_ip::client_ip,
    AppState,
};

async fn submit(req: &HttpRequest, state: &AppState, submission: FormSubmission) -> HttpResponse {
    let origin = client_ip(req, state.config.trust_x_forwarded_for);
    let result = state.dispatcher.submit(submission, origin.as_deref()).await;
    dispatch_response(&result, &result)
}

pub async fn submit_contact(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Json<ContactForm>,
) -> impl Responder {
    submit(&req, &state, FormSubmission::Contact(form.into_inner())).await
}

pub async fn submit_contact_popup(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Json<ContactForm>,
) -> impl Responder {
    submit(&req, &state, FormSubmission::ContactPopup(form.into_inner())).await
}

pub async fn submit_expert(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Json<ExpertForm>,
) -> impl Responder {
    submit(&req, &state, FormSubmission::Expert(form.into_inner())).await
}

pub async fn submit_job_application(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Json<JobApplicationForm>,
) -> impl Responder {
    submit(&req, &state, FormSubmission::JobApplication(form.into_inner())).await
}

#[derive(Debug, Deserialize)]
pub struct RateLimitQuery {
    pub email: Option<String>,
}

/// Remaining quota for a submitter on one form.
pub async fn rate_limit_status(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<RateLimitQuery>,
) -> Result<HttpResponse, AppError> {
    let form_type: FormType = path
        .into_inner()
        .parse()
        .map_err(AppError::NotFound)?;
    let origin = client_ip(&req, state.config.trust_x_forwarded_for);

    let status = state
        .dispatcher
        .rate_limit_status(query.email.as_deref(), origin.as_deref(), form_type.as_str(), Utc::now())
        .await?;

    Ok(HttpResponse::Ok().json(status))
}
