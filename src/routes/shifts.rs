use actix_web::web;

use crate::handlers::shifts;
use crate::middleware::{CacheLayer, ResponseCacheMiddleware};

pub fn configure(cfg: &mut web::ServiceConfig, cache: &CacheLayer) {
    cfg.service(
        web::scope("/shifts")
            .wrap(ResponseCacheMiddleware::new(cache.clone()))
            .route("", web::post().to(shifts::create_shift))
            .route("", web::get().to(shifts::get_shifts))
            .route("/{id}", web::get().to(shifts::get_shift))
            .route("/{id}", web::put().to(shifts::update_shift))
            .route("/{id}", web::delete().to(shifts::delete_shift)),
    );
}
