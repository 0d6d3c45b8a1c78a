use actix_web::{get, HttpResponse, Responder};

#[get("/")]
pub async fn home() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Scritique form notification service",
        "status": "Ok",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ["/api/sendEmail", "/api/health", "/api/v1/forms"]
    }))
}
