use actix_web::web;

use crate::handlers::auth;
use crate::middleware::AuthRateLimiter;

pub fn configure(cfg: &mut web::ServiceConfig, limits: &AuthRateLimiter) {
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/register")
                    .wrap(limits.registration())
                    .route(web::post().to(auth::register)),
            )
            .service(
                web::resource("/login")
                    .wrap(limits.login())
                    .route(web::post().to(auth::login)),
            )
            .route("/me", web::get().to(auth::me)),
    );
}
