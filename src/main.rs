use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware::Logger};
use anyhow::Result;

use dispatch_api::database::init_database;
use dispatch_api::middleware::{
    RateLimitConfig, RateLimitMiddleware, RateLimitStore, RequestIdMiddleware,
    cleanup_rate_limits,
};
use dispatch_api::{AppContext, Config};

const RATE_LIMIT_CLEANUP_SECONDS: u64 = 300;

#[actix_web::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting dispatch scheduling API...");

    let config = Config::from_env()?;
    log::info!(
        "Configuration loaded (environment: {}, weekly cap: {}h, UTC offset: {} min)",
        config.environment,
        config.weekly_hours_cap,
        config.center_utc_offset_minutes
    );
    if config.is_production() && config.jwt_secret.starts_with("dispatch-dev-") {
        log::warn!("JWT_SECRET is still the development default");
    }

    let pool = init_database(&config.database_url).await?;
    log::info!("Database initialized");

    let context = AppContext::new(config.clone(), pool);

    let rate_limit_store = RateLimitStore::new();
    for store in std::iter::once(rate_limit_store.clone()).chain(context.auth_limits.stores()) {
        tokio::spawn(cleanup_rate_limits(store, RATE_LIMIT_CLEANUP_SECONDS));
    }
    let rate_limit_config = RateLimitConfig::from_config(&config);

    let server_address = config.server_address();
    log::info!("Server starting on http://{}", server_address);

    HttpServer::new(move || {
        App::new()
            .configure(|cfg| context.configure(cfg))
            .wrap(
                RateLimitMiddleware::with_store(rate_limit_config.clone(), rate_limit_store.clone())
                    .with_authenticated_users(),
            )
            .wrap(RequestIdMiddleware)
            .wrap(Logger::new(
                r#"%a "%r" %s %b "%{Referer}i" "%{User-Agent}i" %T correlation_id=%{x-correlation-id}o"#,
            ))
            .wrap(
                Cors::default()
                    .allowed_origin(&config.client_base_url)
                    .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                    .allowed_headers(vec![
                        "Authorization",
                        "Content-Type",
                        "Accept",
                        "X-Requested-With",
                        "X-Correlation-ID",
                    ])
                    .expose_headers(vec!["X-Correlation-ID"])
                    .max_age(3600),
            )
    })
    .bind(&server_address)?
    .run()
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
