use actix_web::web;

use crate::handlers::{home::home, json_error::not_found};

mod api;
mod forms;
mod json_error;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(home);

    cfg.service(
        web::scope("/api")
            .configure(api::config_routes)
            .service(
                web::scope("/v1")
                    .configure(forms::config_routes)
            )
    );

    cfg.configure(json_error::config_routes)
        .default_service(web::route().to(not_found));
}
