use actix_web::web;

use crate::handlers::forms;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/forms")
            .service(
                web::resource("/contact")
                    .route(web::post().to(forms::submit_contact))
            )
            .service(
                web::resource("/contact-popup")
                    .route(web::post().to(forms::submit_contact_popup))
            )
            .service(
                web::resource("/expert")
                    .route(web::post().to(forms::submit_expert))
            )
            .service(
                web::resource("/job-application")
                    .route(web::post().to(forms::submit_job_application))
            )
            .service(
                web::resource("/{form_type}/rate-limit")
                    .route(web::get().to(forms::rate_limit_status))
            )
    );
}
