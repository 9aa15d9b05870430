use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::config::Config;
use crate::database::models::{
    Shift, TimeOffQuery, TimeOffRequest, TimeOffRequestInput, TimeOffStatus,
};
use crate::database::repositories::{ShiftRepository, TimeOffRepository};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::schedule::{self, time_off as rules};
use crate::services::auth::Claims;

#[derive(Debug, Default, Deserialize)]
pub struct ReviewRequest {
    pub notes: Option<String>,
    /// Approve even when the employee still has shifts in the range.
    #[serde(default)]
    pub force: bool,
}

async fn load_request(
    time_off: &TimeOffRepository,
    request_id: Uuid,
) -> Result<TimeOffRequest, AppError> {
    time_off
        .find_by_id(request_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Time-off request not found".to_string()))
}

/// The employee's shifts that fall on the requested dates.
async fn shifts_in_request(
    shifts: &ShiftRepository,
    request: &TimeOffRequest,
    config: &Config,
) -> Result<Vec<Shift>, AppError> {
    let offset = config.offset();
    let (from, to) = rules::range_window(request.start_date, request.end_date, offset)?;
    let candidates = shifts.for_employee(request.employee_id, from, to).await?;

    Ok(rules::conflicting_shifts(
        request.employee_id,
        request.start_date,
        request.end_date,
        &candidates,
        offset,
    )
    .into_iter()
    .cloned()
    .collect())
}

fn require_reviewer(claims: &Claims, request: &TimeOffRequest) -> Result<(), AppError> {
    claims.require_schedule_manager()?;
    if request.employee_id == claims.employee_id() {
        return Err(AppError::Forbidden(
            "Cannot review your own time-off request".to_string(),
        ));
    }
    if request.status != TimeOffStatus::Pending {
        return Err(AppError::Conflict(format!(
            "Time-off request is already {}",
            request.status
        )));
    }
    Ok(())
}

pub async fn create_request(
    claims: Claims,
    input: web::Json<TimeOffRequestInput>,
    config: web::Data<Config>,
    time_off: web::Data<TimeOffRepository>,
) -> Result<HttpResponse, AppError> {
    let input = input.into_inner();
    let employee_id = input.employee_id.unwrap_or(claims.employee_id());
    claims.require_self_or_schedule_manager(employee_id)?;

    let today = schedule::local_date(Utc::now(), config.offset());
    rules::validate_range(input.start_date, input.end_date, today)?;

    let overlapping = time_off
        .list(&TimeOffQuery {
            employee_id: Some(employee_id),
            status: None,
            from: Some(input.start_date),
            to: Some(input.end_date),
        })
        .await?;
    if let Some(existing) = overlapping
        .iter()
        .find(|r| matches!(r.status, TimeOffStatus::Pending | TimeOffStatus::Approved))
    {
        return Err(AppError::Conflict(format!(
            "Overlaps {} time-off request {} ({} to {})",
            existing.status, existing.id, existing.start_date, existing.end_date
        )));
    }

    let request = time_off
        .create(
            employee_id,
            input.start_date,
            input.end_date,
            input.request_type,
            input.reason,
        )
        .await
        .map_err(|e| {
            log::error!("Failed to create time-off request: {}", e);
            AppError::from(e)
        })?;

    log::info!(
        "Time-off request {} filed for employee {} ({} to {})",
        request.id,
        employee_id,
        request.start_date,
        request.end_date
    );

    Ok(ApiResponse::created(request))
}

pub async fn get_requests(
    claims: Claims,
    query: web::Query<TimeOffQuery>,
    time_off: web::Data<TimeOffRepository>,
) -> Result<HttpResponse, AppError> {
    let mut query = query.into_inner();

    if !claims.can_manage_schedule() {
        match query.employee_id {
            Some(id) if id != claims.employee_id() => {
                return Err(AppError::Forbidden(
                    "Cannot view another employee's time off".to_string(),
                ));
            }
            _ => query.employee_id = Some(claims.employee_id()),
        }
    }

    let requests = time_off.list(&query).await?;

    Ok(ApiResponse::success(requests))
}

pub async fn get_request(
    claims: Claims,
    path: web::Path<Uuid>,
    time_off: web::Data<TimeOffRepository>,
) -> Result<HttpResponse, AppError> {
    let request = load_request(&time_off, path.into_inner()).await?;
    claims.require_self_or_schedule_manager(request.employee_id)?;

    Ok(ApiResponse::success(request))
}

pub async fn approve_request(
    claims: Claims,
    path: web::Path<Uuid>,
    body: Option<web::Json<ReviewRequest>>,
    config: web::Data<Config>,
    time_off: web::Data<TimeOffRepository>,
    shifts: web::Data<ShiftRepository>,
) -> Result<HttpResponse, AppError> {
    let review = body.map(web::Json::into_inner).unwrap_or_default();
    let request = load_request(&time_off, path.into_inner()).await?;
    require_reviewer(&claims, &request)?;

    let conflicts = shifts_in_request(&shifts, &request, &config).await?;
    if !conflicts.is_empty() {
        if !review.force {
            let details = serde_json::to_value(&conflicts).map_err(|e| {
                AppError::internal_server_error_message(format!(
                    "Failed to serialize conflicts: {e}"
                ))
            })?;
            return Err(AppError::RuleViolation {
                message: format!(
                    "Employee has {} shift(s) during the requested time off",
                    conflicts.len()
                ),
                details,
            });
        }
        log::warn!(
            "Time-off request {} approved over {} conflicting shift(s)",
            request.id,
            conflicts.len()
        );
    }

    let approved = time_off
        .review(
            request.id,
            TimeOffStatus::Approved,
            claims.employee_id(),
            review.notes,
        )
        .await?
        .ok_or_else(|| AppError::Conflict("Time-off request is no longer pending".to_string()))?;

    log::info!(
        "Time-off request {} approved by {}",
        approved.id,
        claims.employee_id()
    );

    Ok(ApiResponse::success(approved))
}

pub async fn reject_request(
    claims: Claims,
    path: web::Path<Uuid>,
    body: Option<web::Json<ReviewRequest>>,
    time_off: web::Data<TimeOffRepository>,
) -> Result<HttpResponse, AppError> {
    let review = body.map(web::Json::into_inner).unwrap_or_default();
    let request = load_request(&time_off, path.into_inner()).await?;
    require_reviewer(&claims, &request)?;

    let rejected = time_off
        .review(
            request.id,
            TimeOffStatus::Rejected,
            claims.employee_id(),
            review.notes,
        )
        .await?
        .ok_or_else(|| AppError::Conflict("Time-off request is no longer pending".to_string()))?;

    log::info!(
        "Time-off request {} rejected by {}",
        rejected.id,
        claims.employee_id()
    );

    Ok(ApiResponse::success(rejected))
}

pub async fn cancel_request(
    claims: Claims,
    path: web::Path<Uuid>,
    time_off: web::Data<TimeOffRepository>,
) -> Result<HttpResponse, AppError> {
    let request = load_request(&time_off, path.into_inner()).await?;
    claims.require_self_or_schedule_manager(request.employee_id)?;

    let cancelled = time_off.cancel(request.id).await?.ok_or_else(|| {
        AppError::Conflict(format!("Time-off request is already {}", request.status))
    })?;

    log::info!(
        "Time-off request {} cancelled by {}",
        cancelled.id,
        claims.employee_id()
    );

    Ok(ApiResponse::success(cancelled))
}

/// Shifts the employee holds inside the requested dates.
pub async fn get_conflicts(
    claims: Claims,
    path: web::Path<Uuid>,
    config: web::Data<Config>,
    time_off: web::Data<TimeOffRepository>,
    shifts: web::Data<ShiftRepository>,
) -> Result<HttpResponse, AppError> {
    let request = load_request(&time_off, path.into_inner()).await?;
    claims.require_self_or_schedule_manager(request.employee_id)?;

    let conflicts = shifts_in_request(&shifts, &request, &config).await?;

    Ok(ApiResponse::success(conflicts))
}
