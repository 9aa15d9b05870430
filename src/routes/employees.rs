use actix_web::web;

use crate::handlers::employees;
use crate::middleware::{CacheLayer, ResponseCacheMiddleware};

pub fn configure(cfg: &mut web::ServiceConfig, cache: &CacheLayer) {
    cfg.service(
        web::scope("/employees")
            .wrap(ResponseCacheMiddleware::new(cache.clone()))
            .route("", web::get().to(employees::list_employees))
            .route("/{id}/weekly-hours", web::get().to(employees::weekly_hours)),
    );
}
