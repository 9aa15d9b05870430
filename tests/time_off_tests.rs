use actix_web::{App, http::StatusCode, test};
use chrono::{Duration, NaiveTime, Utc};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

use dispatch_api::AppContext;
use dispatch_api::database::models::{EmployeeRole, ShiftInput};
use dispatch_api::database::repositories::ShiftRepository;
use dispatch_api::handlers::shared::ApiResponse;

mod common;

fn request_body(start_in_days: i64, length_days: i64, employee_id: Option<Uuid>) -> Value {
    let start = Utc::now().date_naive() + Duration::days(start_in_days);
    json!({
        "employeeId": employee_id,
        "startDate": start,
        "endDate": start + Duration::days(length_days),
        "requestType": "vacation",
        "reason": "Family trip",
    })
}

#[actix_web::test]
async fn rejects_invalid_date_ranges() {
    let ctx = common::context();
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;
    let (_, token) = common::token_for(EmployeeRole::Dispatcher);

    // starts in the past, ends before it starts, longer than 90 days
    for body in [
        request_body(-3, 1, None),
        request_body(10, -2, None),
        request_body(5, 120, None),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/v1/time-off")
            .insert_header(common::bearer(&token))
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: ApiResponse<Value> = test::read_body_json(resp).await;
        assert!(!body.success);
    }
}

#[actix_web::test]
async fn rejects_dates_past_the_calendar() {
    let ctx = common::context();
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;
    let (_, token) = common::token_for(EmployeeRole::Dispatcher);

    let req = test::TestRequest::post()
        .uri("/api/v1/time-off")
        .insert_header(common::bearer(&token))
        .set_json(json!({
            "startDate": "+262142-12-31",
            "endDate": "+262142-12-31",
            "requestType": "vacation",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn dispatchers_cannot_file_for_others() {
    let ctx = common::context();
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;
    let (_, token) = common::token_for(EmployeeRole::Dispatcher);

    let req = test::TestRequest::post()
        .uri("/api/v1/time-off")
        .insert_header(common::bearer(&token))
        .set_json(request_body(7, 2, Some(Uuid::new_v4())))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn dispatchers_cannot_list_others_requests() {
    let ctx = common::context();
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;
    let (_, token) = common::token_for(EmployeeRole::Dispatcher);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/time-off?employeeId={}", Uuid::new_v4()))
        .insert_header(common::bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn time_off_requires_a_token() {
    let ctx = common::context();
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/time-off")
        .set_json(request_body(7, 2, None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/time-off/{}/approve", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn overlapping_requests_conflict(pool: PgPool) -> anyhow::Result<()> {
    let ctx = AppContext::new(common::test_config(), pool.clone());
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;
    let dispatcher = common::seed_employee(&pool, EmployeeRole::Dispatcher).await?;
    let token = common::token_for_employee(&dispatcher);

    let req = test::TestRequest::post()
        .uri("/api/v1/time-off")
        .insert_header(common::bearer(&token))
        .set_json(request_body(10, 2, None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // shares one day with the pending request
    let req = test::TestRequest::post()
        .uri("/api/v1/time-off")
        .insert_header(common::bearer(&token))
        .set_json(request_body(12, 3, None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let body: ApiResponse<Value> = test::read_body_json(resp).await;
    assert!(body.message.unwrap_or_default().contains("Overlaps pending"));

    let req = test::TestRequest::post()
        .uri("/api/v1/time-off")
        .insert_header(common::bearer(&token))
        .set_json(request_body(13, 1, None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn approval_over_shifts_needs_force(pool: PgPool) -> anyhow::Result<()> {
    let ctx = AppContext::new(common::test_config(), pool.clone());
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;
    let manager = common::seed_employee(&pool, EmployeeRole::Manager).await?;
    let dispatcher = common::seed_employee(&pool, EmployeeRole::Dispatcher).await?;
    let manager_token = common::token_for_employee(&manager);

    let req = test::TestRequest::post()
        .uri("/api/v1/time-off")
        .insert_header(common::bearer(&common::token_for_employee(&dispatcher)))
        .set_json(request_body(10, 2, None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: ApiResponse<Value> = test::read_body_json(resp).await;
    let request_id = created.data.expect("created request")["id"]
        .as_str()
        .expect("request id")
        .to_string();

    let day = Utc::now().date_naive() + Duration::days(11);
    let start = day
        .and_time(NaiveTime::from_hms_opt(8, 0, 0).unwrap())
        .and_utc();
    ShiftRepository::new(pool.clone())
        .create(
            ShiftInput {
                employee_id: dispatcher.id,
                start_time: start,
                end_time: start + Duration::hours(8),
                is_supervisor: false,
                notes: None,
            },
            manager.id,
        )
        .await?;

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/time-off/{request_id}/approve"))
        .insert_header(common::bearer(&manager_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: ApiResponse<Value> = test::read_body_json(resp).await;
    let conflicts = body.data.expect("conflicting shifts");
    assert_eq!(conflicts.as_array().map(Vec::len), Some(1));

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/time-off/{request_id}/approve"))
        .insert_header(common::bearer(&manager_token))
        .set_json(json!({ "force": true, "notes": "Covered by overtime" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: ApiResponse<Value> = test::read_body_json(resp).await;
    let approved = body.data.expect("approved request");
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["reviewedBy"], json!(manager.id));
    Ok(())
}
