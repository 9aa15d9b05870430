use actix_web::web;

use crate::handlers::swaps;
use crate::middleware::{CacheLayer, ResponseCacheMiddleware};

pub fn configure(cfg: &mut web::ServiceConfig, cache: &CacheLayer) {
    cfg.service(
        web::scope("/swaps")
            .wrap(ResponseCacheMiddleware::new(cache.clone()))
            .route("", web::post().to(swaps::create_swap))
            .route("", web::get().to(swaps::get_swaps))
            .route("/{id}", web::get().to(swaps::get_swap))
            .route("/{id}/accept", web::post().to(swaps::accept_swap))
            .route("/{id}/reject", web::post().to(swaps::reject_swap))
            .route("/{id}/cancel", web::post().to(swaps::cancel_swap)),
    );
}
