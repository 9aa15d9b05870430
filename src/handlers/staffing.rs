use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::config::Config;
use crate::database::models::StaffingRequirementInput;
use crate::database::repositories::{ShiftRepository, StaffingRepository};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::schedule::{self, generate, staffing};
use crate::services::auth::Claims;

#[derive(Debug, Deserialize)]
pub struct OverviewQuery {
    pub date: Option<NaiveDate>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl OverviewQuery {
    /// Either a single `date` or a `from`/`to` pair, inclusive.
    pub fn range(&self) -> Result<(NaiveDate, NaiveDate), AppError> {
        let (from, to) = match (self.date, self.from, self.to) {
            (Some(date), None, None) => (date, date),
            (None, Some(from), Some(to)) => (from, to),
            _ => {
                return Err(AppError::BadRequest(
                    "Provide either date or both from and to".to_string(),
                ));
            }
        };

        generate::check_range(from, to)?;

        Ok((from, to))
    }
}

pub async fn create_requirement(
    claims: Claims,
    input: web::Json<StaffingRequirementInput>,
    requirements: web::Data<StaffingRepository>,
) -> Result<HttpResponse, AppError> {
    claims.require_manager()?;

    let input = input.into_inner();
    staffing::validate_requirement(&input)?;

    let requirement = requirements.create(input).await?;
    log::info!(
        "Staffing requirement {} ({}) created",
        requirement.id,
        requirement.name
    );

    Ok(ApiResponse::created(requirement))
}

pub async fn get_requirements(
    _claims: Claims,
    requirements: web::Data<StaffingRepository>,
) -> Result<HttpResponse, AppError> {
    let requirements = requirements.list().await?;

    Ok(ApiResponse::success(requirements))
}

pub async fn update_requirement(
    claims: Claims,
    path: web::Path<Uuid>,
    input: web::Json<StaffingRequirementInput>,
    requirements: web::Data<StaffingRepository>,
) -> Result<HttpResponse, AppError> {
    claims.require_manager()?;

    let input = input.into_inner();
    staffing::validate_requirement(&input)?;

    let requirement_id = path.into_inner();
    let requirement = requirements
        .update(requirement_id, input)
        .await?
        .ok_or_else(|| AppError::NotFound("Staffing requirement not found".to_string()))?;

    Ok(ApiResponse::success(requirement))
}

pub async fn delete_requirement(
    claims: Claims,
    path: web::Path<Uuid>,
    requirements: web::Data<StaffingRepository>,
) -> Result<HttpResponse, AppError> {
    claims.require_manager()?;

    let requirement_id = path.into_inner();
    if !requirements.delete(requirement_id).await? {
        return Err(AppError::NotFound(
            "Staffing requirement not found".to_string(),
        ));
    }

    log::info!("Staffing requirement {} deleted", requirement_id);

    Ok(ApiResponse::<()>::message("Staffing requirement deleted"))
}

/// Required versus scheduled headcount for every block in the range.
pub async fn overview(
    _claims: Claims,
    query: web::Query<OverviewQuery>,
    config: web::Data<Config>,
    requirements: web::Data<StaffingRepository>,
    shifts: web::Data<ShiftRepository>,
) -> Result<HttpResponse, AppError> {
    let (from, to) = query.range()?;
    let offset = config.offset();

    let requirements = requirements.list().await?;
    // Overnight blocks on `to` end the day after
    let shifts = shifts
        .in_window(
            schedule::local_midnight(from, 0, offset)?,
            schedule::local_midnight(to, 2, offset)?,
        )
        .await?;

    let coverage = staffing::coverage_for_range(&requirements, &shifts, from, to, offset);

    Ok(ApiResponse::success(coverage))
}
