use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::database::models::{EmployeeInfo, EmployeeRole};
use crate::database::repositories::{EmployeeRepository, ShiftRepository};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::schedule::{self, WeeklyHours, weekly_hours};
use crate::services::auth::Claims;

/// Longest range the weekly-hours report covers.
const MAX_REPORT_DAYS: i64 = 366;

#[derive(Debug, Deserialize)]
pub struct EmployeeListQuery {
    pub role: Option<EmployeeRole>,
}

#[derive(Debug, Deserialize)]
pub struct WeeklyHoursQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyHoursReport {
    pub employee_id: Uuid,
    pub cap_hours: i64,
    pub weeks: Vec<WeeklyHours>,
    pub over_cap: Vec<WeeklyHours>,
}

pub async fn list_employees(
    _claims: Claims,
    employees: web::Data<EmployeeRepository>,
    query: web::Query<EmployeeListQuery>,
) -> Result<HttpResponse, AppError> {
    let employees: Vec<EmployeeInfo> = employees
        .list_active(query.role)
        .await?
        .into_iter()
        .map(EmployeeInfo::from)
        .collect();

    Ok(ApiResponse::success(employees))
}

/// Hours per ISO week for shifts starting between `from` and `to`, both inclusive.
pub async fn weekly_hours(
    claims: Claims,
    path: web::Path<Uuid>,
    query: web::Query<WeeklyHoursQuery>,
    config: web::Data<Config>,
    employees: web::Data<EmployeeRepository>,
    shifts: web::Data<ShiftRepository>,
) -> Result<HttpResponse, AppError> {
    let employee_id = path.into_inner();
    claims.require_self_or_schedule_manager(employee_id)?;

    let WeeklyHoursQuery { from, to } = query.into_inner();
    schedule::check_supported(from)?;
    schedule::check_supported(to)?;
    if to < from {
        return Err(AppError::BadRequest(format!(
            "Range end {to} is before start {from}"
        )));
    }
    if (to - from).num_days() >= MAX_REPORT_DAYS {
        return Err(AppError::BadRequest(format!(
            "Range may cover at most {MAX_REPORT_DAYS} days"
        )));
    }

    employees
        .find_by_id(employee_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

    let offset = config.offset();
    let window_start = schedule::local_midnight(from, 0, offset)?;
    let window_end = schedule::local_midnight(to, 1, offset)?;

    let in_range: Vec<_> = shifts
        .for_employee(employee_id, window_start, window_end)
        .await?
        .into_iter()
        .filter(|s| s.start_time >= window_start && s.start_time < window_end)
        .collect();

    let report = WeeklyHoursReport {
        employee_id,
        cap_hours: config.weekly_hours_cap,
        weeks: weekly_hours::weekly_totals(&in_range, offset),
        over_cap: weekly_hours::over_cap(&in_range, config.weekly_hours_cap, offset),
    };

    Ok(ApiResponse::success(report))
}
