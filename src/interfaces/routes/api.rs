use actix_web::web;

use crate::handlers::{send_email::send_email, system};

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(send_email)
        .service(system::health_check)
        .service(system::transport_check);
}
