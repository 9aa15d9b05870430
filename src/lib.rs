pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod schedule;
pub mod services;

use actix_web::web;
use sqlx::PgPool;

pub use config::Config;
pub use services::AuthService;

use database::repositories::{
    EmployeeRepository, ShiftRepository, StaffingRepository, SwapRepository, TimeOffRepository,
};
use middleware::{AuthRateLimiter, CacheLayer};

const RESPONSE_CACHE_CAPACITY: u64 = 10_000;

/// State shared by every worker. Built once per server, then cloned into each
/// worker's `App`.
#[derive(Clone)]
pub struct AppContext {
    pub config: Config,
    pub pool: PgPool,
    pub cache: CacheLayer,
    pub auth_limits: AuthRateLimiter,
}

impl AppContext {
    pub fn new(config: Config, pool: PgPool) -> Self {
        let cache = CacheLayer::new(RESPONSE_CACHE_CAPACITY, config.cache_ttl_seconds);
        Self {
            config,
            pool,
            cache,
            auth_limits: AuthRateLimiter::new(),
        }
    }

    /// Registers app data and all routes.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        let employee_repository = EmployeeRepository::new(self.pool.clone());
        let auth_service = AuthService::new(self.config.clone(), employee_repository.clone());

        cfg.app_data(web::Data::new(self.config.clone()))
            .app_data(web::Data::new(auth_service))
            .app_data(web::Data::new(employee_repository))
            .app_data(web::Data::new(ShiftRepository::new(self.pool.clone())))
            .app_data(web::Data::new(StaffingRepository::new(self.pool.clone())))
            .app_data(web::Data::new(TimeOffRepository::new(self.pool.clone())))
            .app_data(web::Data::new(SwapRepository::new(self.pool.clone())));

        routes::configure(cfg, &self.cache, &self.auth_limits);
    }
}
