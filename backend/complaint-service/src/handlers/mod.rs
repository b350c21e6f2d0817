//! HTTP surface

pub mod accounts;
pub mod actor;
pub mod complaints;

use crate::error::ComplaintError;
use crate::metrics;
use actix_web::{error::JsonPayloadError, web, HttpRequest, HttpResponse};

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

pub async fn ready() -> HttpResponse {
    HttpResponse::Ok().body("READY")
}

pub async fn metrics_endpoint() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics::gather_metrics())
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ComplaintError::InvalidInput(err.to_string()).into()
}

/// Register every route. Shared by `main` and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .route("/health", web::get().to(health))
        .route("/ready", web::get().to(ready))
        .route("/metrics", web::get().to(metrics_endpoint))
        .service(
            web::scope("/api/v1")
                .service(
                    web::scope("/complaints")
                        .route("", web::post().to(complaints::submit_complaint))
                        .route("", web::get().to(complaints::list_complaints))
                        .route(
                            "/track/{complaint_id}",
                            web::get().to(complaints::track_complaint),
                        )
                        .route("/{id}", web::get().to(complaints::get_complaint))
                        .route(
                            "/{id}/description",
                            web::patch().to(complaints::edit_description),
                        )
                        .route("/{id}/status", web::post().to(complaints::transition_status))
                        .route("/{id}/duplicate", web::post().to(complaints::mark_duplicate))
                        .route(
                            "/{id}/duplicate",
                            web::delete().to(complaints::unmark_duplicate),
                        )
                        .route("/{id}/abuse", web::post().to(complaints::flag_abusive))
                        .route("/{id}/abuse", web::delete().to(complaints::unflag_abusive)),
                )
                .service(
                    web::scope("/accounts")
                        .route("/{id}", web::get().to(accounts::get_account))
                        .route("/{id}/ban", web::post().to(accounts::ban_account)),
                ),
        );
}
