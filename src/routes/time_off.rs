use actix_web::web;

use crate::handlers::time_off;
use crate::middleware::{CacheLayer, ResponseCacheMiddleware};

pub fn configure(cfg: &mut web::ServiceConfig, cache: &CacheLayer) {
    cfg.service(
        web::scope("/time-off")
            .wrap(ResponseCacheMiddleware::new(cache.clone()))
            .route("", web::post().to(time_off::create_request))
            .route("", web::get().to(time_off::get_requests))
            .route("/{id}", web::get().to(time_off::get_request))
            .route("/{id}/approve", web::post().to(time_off::approve_request))
            .route("/{id}/reject", web::post().to(time_off::reject_request))
            .route("/{id}/cancel", web::post().to(time_off::cancel_request))
            .route("/{id}/conflicts", web::get().to(time_off::get_conflicts)),
    );
}
