use actix_web::{HttpResponse, web};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::config::Config;
use crate::database::models::{
    Employee, Shift, ShiftSwap, ShiftSwapInput, SwapQuery, SwapStatus,
};
use crate::database::repositories::{
    EmployeeRepository, ShiftRepository, SwapRepository, TimeOffRepository,
};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::schedule::{self, SwapAction, swap as rules};
use crate::services::auth::Claims;

async fn load_swap(swaps: &SwapRepository, swap_id: Uuid) -> Result<ShiftSwap, AppError> {
    swaps
        .find_by_id(swap_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Swap request not found".to_string()))
}

async fn load_shift(shifts: &ShiftRepository, shift_id: Uuid) -> Result<Shift, AppError> {
    shifts
        .find_by_id(shift_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Shift {shift_id} not found")))
}

async fn load_employee(
    employees: &EmployeeRepository,
    employee_id: Uuid,
) -> Result<Employee, AppError> {
    employees
        .find_by_id(employee_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Employee {employee_id} not found")))
}

/// Status the swap moves to when the caller performs `action`.
fn check_transition(
    claims: &Claims,
    swap: &ShiftSwap,
    action: SwapAction,
) -> Result<SwapStatus, AppError> {
    let actors = rules::actors_for(
        swap.requester_id,
        swap.recipient_id,
        claims.employee_id(),
        claims.is_manager(),
    );
    Ok(rules::transition(swap.status, action, &actors)?)
}

pub async fn create_swap(
    claims: Claims,
    input: web::Json<ShiftSwapInput>,
    employees: web::Data<EmployeeRepository>,
    shifts: web::Data<ShiftRepository>,
    swaps: web::Data<SwapRepository>,
) -> Result<HttpResponse, AppError> {
    let input = input.into_inner();

    let requester_shift = load_shift(&shifts, input.requester_shift_id).await?;
    let recipient_shift = load_shift(&shifts, input.recipient_shift_id).await?;
    let requester = load_employee(&employees, claims.employee_id()).await?;
    let recipient = load_employee(&employees, recipient_shift.employee_id).await?;

    rules::validate_swap(
        &requester,
        &requester_shift,
        &recipient,
        &recipient_shift,
        Utc::now(),
    )?;

    let pending = swaps
        .pending_for_shifts(&[requester_shift.id, recipient_shift.id])
        .await?;
    if let Some(existing) = pending.first() {
        return Err(AppError::Conflict(format!(
            "Swap request {} is already pending for one of these shifts",
            existing.id
        )));
    }

    let swap = swaps
        .create(
            requester.id,
            requester_shift.id,
            recipient.id,
            recipient_shift.id,
            input.notes,
        )
        .await
        .map_err(|e| {
            log::error!("Failed to create swap request: {}", e);
            AppError::from(e)
        })?;

    log::info!(
        "Swap {} requested by {} with {}",
        swap.id,
        swap.requester_id,
        swap.recipient_id
    );

    Ok(ApiResponse::created(swap))
}

pub async fn get_swaps(
    claims: Claims,
    query: web::Query<SwapQuery>,
    swaps: web::Data<SwapRepository>,
) -> Result<HttpResponse, AppError> {
    let mut query = query.into_inner();

    if !claims.can_manage_schedule() {
        match query.employee_id {
            Some(id) if id != claims.employee_id() => {
                return Err(AppError::Forbidden(
                    "Cannot view another employee's swaps".to_string(),
                ));
            }
            _ => query.employee_id = Some(claims.employee_id()),
        }
    }

    let swaps = swaps.list(&query).await?;

    Ok(ApiResponse::success(swaps))
}

pub async fn get_swap(
    claims: Claims,
    path: web::Path<Uuid>,
    swaps: web::Data<SwapRepository>,
) -> Result<HttpResponse, AppError> {
    let swap = load_swap(&swaps, path.into_inner()).await?;

    let is_party = claims.employee_id() == swap.requester_id
        || claims.employee_id() == swap.recipient_id;
    if !is_party && !claims.can_manage_schedule() {
        return Err(AppError::Forbidden(
            "Cannot view another employee's swap".to_string(),
        ));
    }

    Ok(ApiResponse::success(swap))
}

/// Re-checks both employees against their post-swap schedules, then
/// exchanges the shifts.
pub async fn accept_swap(
    claims: Claims,
    path: web::Path<Uuid>,
    config: web::Data<Config>,
    employees: web::Data<EmployeeRepository>,
    shifts: web::Data<ShiftRepository>,
    time_off: web::Data<TimeOffRepository>,
    swaps: web::Data<SwapRepository>,
) -> Result<HttpResponse, AppError> {
    let swap = load_swap(&swaps, path.into_inner()).await?;
    check_transition(&claims, &swap, SwapAction::Accept)?;

    let requester_shift = load_shift(&shifts, swap.requester_shift_id).await?;
    let recipient_shift = load_shift(&shifts, swap.recipient_shift_id).await?;
    let requester = load_employee(&employees, swap.requester_id).await?;
    let recipient = load_employee(&employees, swap.recipient_id).await?;

    rules::validate_swap(
        &requester,
        &requester_shift,
        &recipient,
        &recipient_shift,
        Utc::now(),
    )?;

    let offset = config.offset();
    let week = Duration::days(7);
    let (window_start, window_end) = requester_shift
        .start_time
        .min(recipient_shift.start_time)
        .checked_sub_signed(week)
        .zip(
            requester_shift
                .end_time
                .max(recipient_shift.end_time)
                .checked_add_signed(week),
        )
        .ok_or_else(|| AppError::BadRequest("Shifts are outside the supported calendar".to_string()))?;

    let mut nearby = shifts
        .for_employee(requester.id, window_start, window_end)
        .await?;
    nearby.extend(
        shifts
            .for_employee(recipient.id, window_start, window_end)
            .await?,
    );

    let leave = time_off
        .approved_between(
            schedule::local_date(window_start, offset),
            schedule::local_date(window_end, offset),
        )
        .await?;

    let conflicts = rules::post_swap_conflicts(
        &requester,
        &requester_shift,
        &recipient,
        &recipient_shift,
        &nearby,
        &leave,
        config.weekly_hours_cap,
        offset,
    );
    if !conflicts.is_empty() {
        return Err(AppError::assignment_conflicts(
            "Swap would break scheduling rules",
            &conflicts,
        ));
    }

    let accepted = swaps.accept(&swap).await?.ok_or_else(|| {
        AppError::Conflict("Swap or its shifts changed while accepting".to_string())
    })?;

    log::info!(
        "Swap {} accepted: shift {} to {}, shift {} to {}",
        accepted.id,
        accepted.requester_shift_id,
        accepted.recipient_id,
        accepted.recipient_shift_id,
        accepted.requester_id
    );

    Ok(ApiResponse::success(accepted))
}

async fn close_swap(
    claims: Claims,
    swap_id: Uuid,
    action: SwapAction,
    swaps: &SwapRepository,
) -> Result<HttpResponse, AppError> {
    let swap = load_swap(swaps, swap_id).await?;
    let status = check_transition(&claims, &swap, action)?;

    let closed = swaps
        .close(swap.id, status)
        .await?
        .ok_or_else(|| AppError::Conflict("Swap request is no longer pending".to_string()))?;

    log::info!(
        "Swap {} {} by {}",
        closed.id,
        closed.status,
        claims.employee_id()
    );

    Ok(ApiResponse::success(closed))
}

pub async fn reject_swap(
    claims: Claims,
    path: web::Path<Uuid>,
    swaps: web::Data<SwapRepository>,
) -> Result<HttpResponse, AppError> {
    close_swap(claims, path.into_inner(), SwapAction::Reject, &swaps).await
}

pub async fn cancel_swap(
    claims: Claims,
    path: web::Path<Uuid>,
    swaps: web::Data<SwapRepository>,
) -> Result<HttpResponse, AppError> {
    close_swap(claims, path.into_inner(), SwapAction::Cancel, &swaps).await
}
