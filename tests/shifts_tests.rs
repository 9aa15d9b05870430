use actix_web::{App, http::StatusCode, test};
use chrono::{DateTime, Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

use dispatch_api::database::models::{EmployeeRole, ProposedShift, ShiftQuery};
use dispatch_api::database::repositories::ShiftRepository;
use dispatch_api::handlers::shared::ApiResponse;

mod common;

fn shift_body(hours: i64) -> Value {
    let start = Utc::now() + Duration::days(3);
    json!({
        "employeeId": Uuid::new_v4(),
        "startTime": start,
        "endTime": start + Duration::hours(hours),
        "isSupervisor": false,
    })
}

#[actix_web::test]
async fn listing_shifts_requires_a_token() {
    let ctx = common::context();
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

    let req = test::TestRequest::get().uri("/api/v1/shifts").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn dispatchers_cannot_write_shifts() {
    let ctx = common::context();
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;
    let (_, token) = common::token_for(EmployeeRole::Dispatcher);

    let req = test::TestRequest::post()
        .uri("/api/v1/shifts")
        .insert_header(common::bearer(&token))
        .set_json(shift_body(8))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/shifts/{}", Uuid::new_v4()))
        .insert_header(common::bearer(&token))
        .set_json(shift_body(8))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/shifts/{}", Uuid::new_v4()))
        .insert_header(common::bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn rejects_inverted_and_overlong_shifts() {
    let ctx = common::context();
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;
    let (_, token) = common::token_for(EmployeeRole::Supervisor);

    let req = test::TestRequest::post()
        .uri("/api/v1/shifts")
        .insert_header(common::bearer(&token))
        .set_json(shift_body(-2))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/v1/shifts")
        .insert_header(common::bearer(&token))
        .set_json(shift_body(17))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: ApiResponse<Value> = test::read_body_json(resp).await;
    assert!(!body.success);
}

#[actix_web::test]
async fn dispatchers_only_list_their_own_shifts() {
    let ctx = common::context();
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;
    let (_, token) = common::token_for(EmployeeRole::Dispatcher);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/shifts?employeeId={}", Uuid::new_v4()))
        .insert_header(common::bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn weekly_hours_are_private_to_the_employee() {
    let ctx = common::context();
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;
    let (employee_id, token) = common::token_for(EmployeeRole::Dispatcher);

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/v1/employees/{}/weekly-hours?from=2025-03-03&to=2025-03-30",
            Uuid::new_v4()
        ))
        .insert_header(common::bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/v1/employees/{employee_id}/weekly-hours?from=2025-03-30&to=2025-03-03"
        ))
        .insert_header(common::bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/v1/employees/{employee_id}/weekly-hours?from=%2B262142-12-01&to=%2B262142-12-31"
        ))
        .insert_header(common::bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn rejects_shifts_past_the_calendar() {
    let ctx = common::context();
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;
    let (_, token) = common::token_for(EmployeeRole::Supervisor);

    let req = test::TestRequest::post()
        .uri("/api/v1/shifts")
        .insert_header(common::bearer(&token))
        .set_json(json!({
            "employeeId": Uuid::new_v4(),
            "startTime": "+262142-12-31T10:00:00Z",
            "endTime": "+262142-12-31T18:00:00Z",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

fn proposed(employee_id: Uuid, start: DateTime<Utc>, is_supervisor: bool) -> ProposedShift {
    ProposedShift {
        id: None,
        employee_id,
        start_time: start,
        end_time: start + Duration::hours(8),
        is_supervisor,
        requirement_id: None,
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn batch_creation_is_all_or_nothing(pool: PgPool) -> anyhow::Result<()> {
    let shifts = ShiftRepository::new(pool.clone());
    let manager = common::seed_employee(&pool, EmployeeRole::Manager).await?;
    let dispatcher = common::seed_employee(&pool, EmployeeRole::Dispatcher).await?;
    let start = Utc.with_ymd_and_hms(2031, 3, 3, 6, 0, 0).unwrap();

    // the second proposal names an employee that does not exist
    let batch = [
        proposed(dispatcher.id, start, false),
        proposed(Uuid::new_v4(), start, false),
    ];
    assert!(shifts.create_many(&batch, manager.id).await.is_err());
    assert!(shifts.in_window(start, start + Duration::days(1)).await?.is_empty());

    let batch = [
        proposed(dispatcher.id, start, false),
        proposed(manager.id, start, true),
    ];
    let created = shifts.create_many(&batch, manager.id).await?;
    assert_eq!(created.len(), 2);
    assert!(created.iter().all(|s| s.created_by == Some(manager.id)));
    assert_eq!(shifts.in_window(start, start + Duration::days(1)).await?.len(), 2);
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn listing_applies_every_filter(pool: PgPool) -> anyhow::Result<()> {
    let shifts = ShiftRepository::new(pool.clone());
    let manager = common::seed_employee(&pool, EmployeeRole::Manager).await?;
    let supervisor = common::seed_employee(&pool, EmployeeRole::Supervisor).await?;
    let dispatcher = common::seed_employee(&pool, EmployeeRole::Dispatcher).await?;
    let monday = Utc.with_ymd_and_hms(2031, 3, 3, 6, 0, 0).unwrap();

    shifts
        .create_many(
            &[
                proposed(dispatcher.id, monday, false),
                proposed(supervisor.id, monday, true),
                proposed(dispatcher.id, monday + Duration::days(2), false),
            ],
            manager.id,
        )
        .await?;

    let all = shifts.list(&ShiftQuery::default()).await?;
    assert_eq!(all.len(), 3);
    assert!(all.windows(2).all(|w| w[0].start_time <= w[1].start_time));

    let mine = shifts
        .list(&ShiftQuery {
            employee_id: Some(dispatcher.id),
            ..Default::default()
        })
        .await?;
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|s| s.employee_id == dispatcher.id));

    // `from`/`to` keep shifts intersecting the window, including one already running
    let first_day = shifts
        .list(&ShiftQuery {
            from: Some(monday + Duration::hours(7)),
            to: Some(monday + Duration::days(1)),
            ..Default::default()
        })
        .await?;
    assert_eq!(first_day.len(), 2);

    let supervisors = shifts
        .list(&ShiftQuery {
            supervisor_only: true,
            ..Default::default()
        })
        .await?;
    assert_eq!(supervisors.len(), 1);
    assert_eq!(supervisors[0].employee_id, supervisor.id);

    let later = shifts
        .for_employee(dispatcher.id, monday + Duration::days(1), monday + Duration::days(3))
        .await?;
    assert_eq!(later.len(), 1);
    assert_eq!(later[0].start_time, monday + Duration::days(2));
    Ok(())
}
