use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use humantime::format_duration;
use serde::Serialize;
use std::time::Duration;

use crate::{
    constants::{HEALTH_CACHE_SECS, START_TIME},
    mail::transport::Transport,
    AppState,
};

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub timestamp: String,
    pub configured: bool,
    pub missing_vars: Vec<String>,
    pub transport: String,
    pub uptime: String,
    pub version: String,
}

#[derive(Serialize)]
struct TransportCheckResponse {
    success: bool,
    message: String,
}

fn build_health_response(state: &AppState) -> HealthResponse {
    let now_utc = Utc::now();
    let uptime_secs = now_utc.signed_duration_since(*START_TIME).num_seconds().max(0) as u64;
    let transport = &state.dispatcher.transport;
    let missing_vars = transport.missing_config();
    let configured = missing_vars.is_empty();

    let (status, message) = if configured {
        ("OK", "Email service is running and ready to send emails".to_string())
    } else {
        (
            "Not configured",
            format!("Email service is missing configuration: {}", missing_vars.join(", ")),
        )
    };

    HealthResponse {
        status: status.to_string(),
        message,
        timestamp: now_utc.to_rfc3339(),
        configured,
        missing_vars,
        transport: transport.name().to_string(),
        uptime: format_duration(Duration::from_secs(uptime_secs)).to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

/// Configuration status of the mail transport. Never touches the network.
#[get("/health")]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let now = Utc::now().timestamp();

    let cached = state
        .health_cache
        .read()
        .as_ref()
        .filter(|(checked_at, _)| now - checked_at <= HEALTH_CACHE_SECS)
        .map(|(_, response)| response.clone());

    let response = match cached {
        Some(response) => response,
        None => {
            let response = build_health_response(&state);
            *state.health_cache.write() = Some((now, response.clone()));
            response
        }
    };

    if response.configured {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

/// Live connectivity check against the mail server or API.
#[get("/health/transport")]
pub async fn transport_check(state: web::Data<AppState>) -> impl Responder {
    let transport = &state.dispatcher.transport;

    match transport.verify().await {
        Ok(()) => HttpResponse::Ok().json(TransportCheckResponse {
            success: true,
            message: format!("{} transport is reachable", transport.name()),
        }),
        Err(e) => {
            tracing::warn!(transport = transport.name(), error = %e, "Transport check failed");
            HttpResponse::ServiceUnavailable().json(TransportCheckResponse {
                success: false,
                message: e.to_string(),
            })
        }
    }
}
