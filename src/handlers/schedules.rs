use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::database::models::Shift;
use crate::database::repositories::{
    EmployeeRepository, ShiftRepository, StaffingRepository, TimeOffRepository,
};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::schedule::{self, GenerateParams, GeneratedSchedule, generate};
use crate::services::auth::Claims;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Write the proposed shifts instead of only returning them.
    #[serde(default)]
    pub persist: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(flatten)]
    pub schedule: GeneratedSchedule,
    pub persisted: Vec<Shift>,
}

pub async fn generate_schedule(
    claims: Claims,
    request: web::Json<GenerateRequest>,
    config: web::Data<Config>,
    employees: web::Data<EmployeeRepository>,
    requirements: web::Data<StaffingRepository>,
    shifts: web::Data<ShiftRepository>,
    time_off: web::Data<TimeOffRepository>,
) -> Result<HttpResponse, AppError> {
    claims.require_manager()?;

    let GenerateRequest { from, to, persist } = request.into_inner();
    generate::check_range(from, to)?;

    let offset = config.offset();
    let staff = employees.list_active(None).await?;
    let requirements = requirements.list().await?;
    // Whole ISO weeks around the range so weekly caps see every shift
    let existing = shifts
        .in_window(
            schedule::local_midnight(from, -7, offset)?,
            schedule::local_midnight(to, 8, offset)?,
        )
        .await?;
    let leave = time_off
        .approved_between(schedule::add_days(from, -1)?, schedule::add_days(to, 1)?)
        .await?;

    let params = GenerateParams {
        from,
        to,
        cap_hours: config.weekly_hours_cap,
        offset,
    };
    let generated = generate::generate(params, &staff, &requirements, &existing, &leave)?;

    if !generated.is_complete() {
        log::warn!(
            "Generated schedule {} to {} leaves {} block(s) short",
            from,
            to,
            generated.unfilled.len()
        );
    }

    let persisted = if persist && !generated.shifts.is_empty() {
        let created = shifts
            .create_many(&generated.shifts, claims.employee_id())
            .await
            .map_err(|e| {
                log::error!("Failed to persist generated schedule: {}", e);
                AppError::from(e)
            })?;
        log::info!(
            "Persisted {} generated shift(s) for {} to {}",
            created.len(),
            from,
            to
        );
        created
    } else {
        Vec::new()
    };

    Ok(ApiResponse::success(GenerateResponse {
        schedule: generated,
        persisted,
    }))
}
