use actix_web::web;

use crate::handlers::system;
use crate::middleware::{AuthRateLimiter, CacheLayer};

pub mod auth;
pub mod employees;
pub mod schedules;
pub mod shifts;
pub mod staffing;
pub mod swaps;
pub mod time_off;

/// Registers every route. Scopes other than auth share `cache`, so a write
/// through any of them invalidates cached reads everywhere.
pub fn configure(cfg: &mut web::ServiceConfig, cache: &CacheLayer, auth_limits: &AuthRateLimiter) {
    cfg.route("/", web::get().to(system::index))
        .route("/health", web::get().to(system::health))
        .service(
            web::scope("/api/v1")
                .configure(|cfg| auth::configure(cfg, auth_limits))
                .configure(|cfg| employees::configure(cfg, cache))
                .configure(|cfg| shifts::configure(cfg, cache))
                .configure(|cfg| staffing::configure(cfg, cache))
                .configure(|cfg| time_off::configure(cfg, cache))
                .configure(|cfg| swaps::configure(cfg, cache))
                .configure(|cfg| schedules::configure(cfg, cache)),
        );
}
