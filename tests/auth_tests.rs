use actix_web::{App, http::StatusCode, test};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use sqlx::PgPool;

use dispatch_api::AppContext;

use dispatch_api::database::models::EmployeeRole;
use dispatch_api::handlers::shared::ApiResponse;

mod common;

#[actix_web::test]
async fn register_rejects_short_password() {
    common::setup_test_env();
    let ctx = common::context();
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({
            "email": common::fake_email(),
            "password": "short",
            "fullName": common::fake_name(),
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: ApiResponse<Value> = test::read_body_json(resp).await;
    assert!(!body.success);
    assert!(body.message.unwrap_or_default().contains("Password"));
}

#[actix_web::test]
async fn register_rejects_invalid_email_and_blank_name() {
    let ctx = common::context();
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({
            "email": "not-an-email",
            "password": "long enough password",
            "fullName": common::fake_name(),
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({
            "email": common::fake_email(),
            "password": "long enough password",
            "fullName": "   ",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn register_rejects_malformed_body() {
    let ctx = common::context();
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({ "email": common::fake_email() }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn me_requires_a_token() {
    let ctx = common::context();
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

    let req = test::TestRequest::get().uri("/api/v1/auth/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: ApiResponse<Value> = test::read_body_json(resp).await;
    assert!(!body.success);
    assert_eq!(body.message.as_deref(), Some("Unauthorized access"));
}

#[actix_web::test]
async fn me_rejects_tokens_signed_elsewhere() {
    let ctx = common::context();
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

    let claims = dispatch_api::services::auth::Claims {
        sub: uuid::Uuid::new_v4(),
        email: common::fake_email(),
        role: EmployeeRole::Manager,
        exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
    };
    let forged = dispatch_api::services::auth::encode_token(&claims, "some-other-secret").unwrap();

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(common::bearer(&forged))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(("Authorization", "Token abc"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn register_treats_padded_and_mixed_case_emails_as_taken(pool: PgPool) {
    let ctx = AppContext::new(common::test_config(), pool);
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

    let register = |email: &str| {
        test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({
                "email": email,
                "password": "correct horse battery",
                "fullName": common::fake_name(),
            }))
            .to_request()
    };

    let resp = test::call_service(&app, register("  Casey.Morgan@Example.com ")).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: ApiResponse<Value> = test::read_body_json(resp).await;
    let employee = &body.data.expect("auth response")["employee"];
    assert_eq!(employee["email"], "casey.morgan@example.com");
    // the first account runs the center
    assert_eq!(employee["role"], "manager");

    let resp = test::call_service(&app, register("casey.morgan@example.com")).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}
