use actix_web::{HttpResponse, web};
use chrono::Duration;
use uuid::Uuid;

use crate::config::Config;
use crate::database::models::{ProposedShift, ShiftInput, ShiftQuery, TimeOffQuery, TimeOffStatus};
use crate::database::repositories::{EmployeeRepository, ShiftRepository, TimeOffRepository};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::schedule::{self, AssignmentContext, assignment};
use crate::services::auth::Claims;

/// Repositories needed to check an assignment against the owner's schedule.
pub struct AssignmentSources<'a> {
    pub employees: &'a EmployeeRepository,
    pub shifts: &'a ShiftRepository,
    pub time_off: &'a TimeOffRepository,
}

impl AssignmentSources<'_> {
    /// Loads the owner's surrounding schedule and runs every assignment rule.
    pub async fn check(&self, candidate: &ProposedShift, config: &Config) -> Result<(), AppError> {
        let offset = config.offset();
        let employee = self
            .employees
            .find_by_id(candidate.employee_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

        // A week either side covers every ISO week the candidate can touch
        let week = Duration::days(7);
        let (window_start, window_end) = candidate
            .start_time
            .checked_sub_signed(week)
            .zip(candidate.end_time.checked_add_signed(week))
            .ok_or_else(|| AppError::BadRequest("Shift is outside the supported calendar".to_string()))?;
        let existing = self
            .shifts
            .for_employee(employee.id, window_start, window_end)
            .await?;

        let time_off = self
            .time_off
            .list(&TimeOffQuery {
                employee_id: Some(employee.id),
                status: Some(TimeOffStatus::Approved),
                from: Some(schedule::add_days(schedule::local_date(candidate.start_time, offset), -1)?),
                to: Some(schedule::add_days(schedule::local_date(candidate.end_time, offset), 1)?),
            })
            .await?;

        let conflicts = AssignmentContext {
            employee: &employee,
            existing: &existing,
            time_off: &time_off,
            cap_hours: config.weekly_hours_cap,
            offset,
        }
        .validate(candidate);

        if conflicts.is_empty() {
            Ok(())
        } else {
            Err(AppError::assignment_conflicts(
                "Cannot assign shift",
                &conflicts,
            ))
        }
    }
}

pub async fn create_shift(
    claims: Claims,
    input: web::Json<ShiftInput>,
    config: web::Data<Config>,
    employees: web::Data<EmployeeRepository>,
    shifts: web::Data<ShiftRepository>,
    time_off: web::Data<TimeOffRepository>,
) -> Result<HttpResponse, AppError> {
    claims.require_schedule_manager()?;

    let input = input.into_inner();
    assignment::validate_shift(&input)?;

    AssignmentSources {
        employees: &employees,
        shifts: &shifts,
        time_off: &time_off,
    }
    .check(&ProposedShift::from_input(&input, None), &config)
    .await?;

    let shift = shifts
        .create(input, claims.employee_id())
        .await
        .map_err(|e| {
            log::error!("Failed to create shift: {}", e);
            AppError::from(e)
        })?;

    log::info!(
        "Shift {} created for employee {} by {}",
        shift.id,
        shift.employee_id,
        claims.employee_id()
    );

    Ok(ApiResponse::created(shift))
}

pub async fn get_shifts(
    claims: Claims,
    query: web::Query<ShiftQuery>,
    shifts: web::Data<ShiftRepository>,
) -> Result<HttpResponse, AppError> {
    let mut query = query.into_inner();

    // Dispatchers only ever see their own shifts
    if !claims.can_manage_schedule() {
        match query.employee_id {
            Some(id) if id != claims.employee_id() => {
                return Err(AppError::Forbidden(
                    "Cannot view another employee's shifts".to_string(),
                ));
            }
            _ => query.employee_id = Some(claims.employee_id()),
        }
    }

    let shifts = shifts.list(&query).await?;

    Ok(ApiResponse::success(shifts))
}

pub async fn get_shift(
    claims: Claims,
    path: web::Path<Uuid>,
    shifts: web::Data<ShiftRepository>,
) -> Result<HttpResponse, AppError> {
    let shift_id = path.into_inner();

    let shift = shifts
        .find_by_id(shift_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Shift not found".to_string()))?;

    claims.require_self_or_schedule_manager(shift.employee_id)?;

    Ok(ApiResponse::success(shift))
}

pub async fn update_shift(
    claims: Claims,
    path: web::Path<Uuid>,
    input: web::Json<ShiftInput>,
    config: web::Data<Config>,
    employees: web::Data<EmployeeRepository>,
    shifts: web::Data<ShiftRepository>,
    time_off: web::Data<TimeOffRepository>,
) -> Result<HttpResponse, AppError> {
    claims.require_schedule_manager()?;

    let shift_id = path.into_inner();
    let input = input.into_inner();
    assignment::validate_shift(&input)?;

    shifts
        .find_by_id(shift_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Shift not found".to_string()))?;

    AssignmentSources {
        employees: &employees,
        shifts: &shifts,
        time_off: &time_off,
    }
    .check(&ProposedShift::from_input(&input, Some(shift_id)), &config)
    .await?;

    let shift = shifts
        .update(shift_id, input)
        .await
        .map_err(|e| {
            log::error!("Failed to update shift {}: {}", shift_id, e);
            AppError::from(e)
        })?
        .ok_or_else(|| AppError::NotFound("Shift not found".to_string()))?;

    log::info!("Shift {} updated by {}", shift.id, claims.employee_id());

    Ok(ApiResponse::success(shift))
}

pub async fn delete_shift(
    claims: Claims,
    path: web::Path<Uuid>,
    shifts: web::Data<ShiftRepository>,
) -> Result<HttpResponse, AppError> {
    claims.require_schedule_manager()?;

    let shift_id = path.into_inner();
    if !shifts.delete(shift_id).await? {
        return Err(AppError::NotFound("Shift not found".to_string()));
    }

    log::info!("Shift {} deleted by {}", shift_id, claims.employee_id());

    Ok(ApiResponse::<()>::message("Shift deleted"))
}
