use actix_web::{HttpResponse, web};

use crate::database::models::{EmployeeInfo, LoginRequest, RegisterRequest};
use crate::database::repositories::EmployeeRepository;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::AuthService;
use crate::services::auth::Claims;

pub async fn register(
    auth_service: web::Data<AuthService>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let response = auth_service.register(request.into_inner()).await?;

    Ok(ApiResponse::created(response))
}

pub async fn login(
    auth_service: web::Data<AuthService>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let response = auth_service.login(request.into_inner()).await?;

    Ok(ApiResponse::success(response))
}

pub async fn me(
    claims: Claims,
    employees: web::Data<EmployeeRepository>,
) -> Result<HttpResponse, AppError> {
    let employee = employees
        .find_by_id(claims.employee_id())
        .await?
        .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

    if !employee.is_active {
        return Err(AppError::Unauthorized);
    }

    Ok(ApiResponse::success(EmployeeInfo::from(employee)))
}
