use actix_web::web;

use crate::handlers::schedules;
use crate::middleware::{CacheLayer, ResponseCacheMiddleware};

pub fn configure(cfg: &mut web::ServiceConfig, cache: &CacheLayer) {
    cfg.service(
        web::scope("/schedules")
            .wrap(ResponseCacheMiddleware::new(cache.clone()))
            .route("/generate", web::post().to(schedules::generate_schedule)),
    );
}
