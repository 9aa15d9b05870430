use actix_web::HttpResponse;
use serde_json::json;

pub async fn index() -> HttpResponse {
    HttpResponse::Ok().body(concat!("Dispatch Scheduling API v", env!("CARGO_PKG_VERSION")))
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now()
    }))
}
