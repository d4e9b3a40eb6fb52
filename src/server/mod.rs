//! The user-facing JSON web server. `POST /classify` runs the
//! classification pipeline; every other route gets a JSON 404.

use actix_web::web;

pub mod protocol;
pub mod routes;

/// Register the classification routes. The pipeline itself is provided by
/// the caller as `web::Data<ClassificationPipeline>`.
pub fn configure(max_payload_bytes: usize) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::PayloadConfig::new(max_payload_bytes))
            .service(routes::classify);
    }
}
