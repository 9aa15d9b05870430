use actix_web::web;

use crate::handlers::staffing;
use crate::middleware::{CacheLayer, ResponseCacheMiddleware};

pub fn configure(cfg: &mut web::ServiceConfig, cache: &CacheLayer) {
    cfg.service(
        web::scope("/staffing-requirements")
            .wrap(ResponseCacheMiddleware::new(cache.clone()))
            .route("", web::post().to(staffing::create_requirement))
            .route("", web::get().to(staffing::get_requirements))
            .route("/{id}", web::put().to(staffing::update_requirement))
            .route("/{id}", web::delete().to(staffing::delete_requirement)),
    )
    .service(
        web::scope("/staffing")
            .wrap(ResponseCacheMiddleware::new(cache.clone()))
            .route("/overview", web::get().to(staffing::overview)),
    );
}
