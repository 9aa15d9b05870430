use actix_web::{App, http::StatusCode, test};
use chrono::{DateTime, Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use dispatch_api::database::models::{EmployeeRole, Shift, ShiftInput, SwapStatus};
use dispatch_api::database::repositories::{ShiftRepository, SwapRepository};

mod common;

#[actix_web::test]
async fn swaps_require_a_token() {
    let ctx = common::context();
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/swaps")
        .set_json(json!({
            "requesterShiftId": Uuid::new_v4(),
            "recipientShiftId": Uuid::new_v4(),
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    for action in ["accept", "reject", "cancel"] {
        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/swaps/{}/{action}", Uuid::new_v4()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{action}");
    }
}

#[actix_web::test]
async fn swap_requests_need_both_shifts() {
    let ctx = common::context();
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;
    let (_, token) = common::token_for(EmployeeRole::Dispatcher);

    let req = test::TestRequest::post()
        .uri("/api/v1/swaps")
        .insert_header(common::bearer(&token))
        .set_json(json!({ "requesterShiftId": Uuid::new_v4() }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn dispatchers_cannot_list_others_swaps() {
    let ctx = common::context();
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;
    let (_, token) = common::token_for(EmployeeRole::Dispatcher);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/swaps?employeeId={}", Uuid::new_v4()))
        .insert_header(common::bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

async fn day_shift(
    shifts: &ShiftRepository,
    employee_id: Uuid,
    start: DateTime<Utc>,
) -> anyhow::Result<Shift> {
    shifts
        .create(
            ShiftInput {
                employee_id,
                start_time: start,
                end_time: start + Duration::hours(8),
                is_supervisor: false,
                notes: None,
            },
            employee_id,
        )
        .await
}

async fn owner_of(shifts: &ShiftRepository, id: Uuid) -> anyhow::Result<Uuid> {
    let shift = shifts.find_by_id(id).await?.expect("shift should exist");
    Ok(shift.employee_id)
}

#[sqlx::test(migrations = "./migrations")]
async fn accepting_exchanges_owners(pool: PgPool) -> anyhow::Result<()> {
    let shifts = ShiftRepository::new(pool.clone());
    let swaps = SwapRepository::new(pool.clone());
    let alex = common::seed_employee(&pool, EmployeeRole::Dispatcher).await?;
    let blair = common::seed_employee(&pool, EmployeeRole::Dispatcher).await?;

    let start = Utc::now() + Duration::days(4);
    let alex_shift = day_shift(&shifts, alex.id, start).await?;
    let blair_shift = day_shift(&shifts, blair.id, start + Duration::days(1)).await?;

    let swap = swaps
        .create(alex.id, alex_shift.id, blair.id, blair_shift.id, None)
        .await?;
    let accepted = swaps.accept(&swap).await?.expect("swap should be accepted");

    assert_eq!(accepted.status, SwapStatus::Accepted);
    assert!(accepted.responded_at.is_some());
    assert_eq!(owner_of(&shifts, alex_shift.id).await?, blair.id);
    assert_eq!(owner_of(&shifts, blair_shift.id).await?, alex.id);

    // a second accept finds nothing pending
    assert!(swaps.accept(&swap).await?.is_none());
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn accepting_rolls_back_when_a_shift_changed_hands(pool: PgPool) -> anyhow::Result<()> {
    let shifts = ShiftRepository::new(pool.clone());
    let swaps = SwapRepository::new(pool.clone());
    let alex = common::seed_employee(&pool, EmployeeRole::Dispatcher).await?;
    let blair = common::seed_employee(&pool, EmployeeRole::Dispatcher).await?;
    let casey = common::seed_employee(&pool, EmployeeRole::Dispatcher).await?;

    let start = Utc::now() + Duration::days(4);
    let alex_shift = day_shift(&shifts, alex.id, start).await?;
    let blair_shift = day_shift(&shifts, blair.id, start + Duration::days(1)).await?;
    let swap = swaps
        .create(alex.id, alex_shift.id, blair.id, blair_shift.id, None)
        .await?;

    // the recipient's shift goes to someone else before the swap is accepted
    shifts
        .update(
            blair_shift.id,
            ShiftInput {
                employee_id: casey.id,
                start_time: blair_shift.start_time,
                end_time: blair_shift.end_time,
                is_supervisor: false,
                notes: None,
            },
        )
        .await?
        .expect("shift should be updated");

    assert!(swaps.accept(&swap).await?.is_none());

    assert_eq!(owner_of(&shifts, alex_shift.id).await?, alex.id);
    assert_eq!(owner_of(&shifts, blair_shift.id).await?, casey.id);
    let stored = swaps.find_by_id(swap.id).await?.expect("swap should exist");
    assert_eq!(stored.status, SwapStatus::Pending);
    assert!(stored.responded_at.is_none());
    Ok(())
}
