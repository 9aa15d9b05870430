use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use anyhow::anyhow;
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::future::{Ready, ready};
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;
use crate::database::models::{
    AuthResponse, Employee, EmployeeRole, LoginRequest, NewEmployee, RegisterRequest,
};
use crate::database::repositories::EmployeeRepository;
use crate::error::AppError;

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: Uuid, // employee id
    pub email: String,
    pub role: EmployeeRole,
    pub exp: usize, // expiration time
}

impl Claims {
    pub fn employee_id(&self) -> Uuid {
        self.sub
    }
    pub fn is_manager(&self) -> bool {
        self.role == EmployeeRole::Manager
    }
    pub fn is_supervisor(&self) -> bool {
        self.role == EmployeeRole::Supervisor
    }
    /// Supervisors and managers run the floor schedule.
    pub fn can_manage_schedule(&self) -> bool {
        self.is_manager() || self.is_supervisor()
    }

    pub fn require_manager(&self) -> Result<(), AppError> {
        if self.is_manager() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Manager role required".to_string()))
        }
    }

    pub fn require_schedule_manager(&self) -> Result<(), AppError> {
        if self.can_manage_schedule() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Supervisor or manager role required".to_string(),
            ))
        }
    }

    /// Own records are always visible; anyone else's only to schedule managers.
    pub fn require_self_or_schedule_manager(&self, employee_id: Uuid) -> Result<(), AppError> {
        if self.sub == employee_id || self.can_manage_schedule() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Cannot access another employee's records".to_string(),
            ))
        }
    }
}

pub fn encode_token(claims: &Claims, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
}

/// The token from an `Authorization: Bearer ...` header, if present.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

impl FromRequest for Claims {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(token) = bearer_token(req) else {
            return ready(Err(AppError::Unauthorized));
        };

        let Some(config) = req.app_data::<Data<Config>>() else {
            log::error!("Config missing from app data, cannot verify token");
            return ready(Err(AppError::internal_server_error()));
        };

        ready(decode_token(token, &config.jwt_secret).map_err(|err| {
            log::debug!("Rejected token: {}", err);
            AppError::Unauthorized
        }))
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already registered")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is inactive")]
    Inactive,

    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<AuthError> for AppError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::EmailTaken => AppError::Conflict(error.to_string()),
            AuthError::InvalidCredentials | AuthError::Inactive => AppError::Unauthorized,
            AuthError::InvalidInput(message) => AppError::BadRequest(message),
            AuthError::Other(err) => err.into(),
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    employee_repository: EmployeeRepository,
    config: Config,
}

impl AuthService {
    pub fn new(config: Config, employee_repository: EmployeeRepository) -> Self {
        Self {
            employee_repository,
            config,
        }
    }

    /// Creates an employee account. The very first account becomes the manager
    /// so a fresh center can bootstrap itself; later ones start as dispatchers.
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AuthError> {
        validate_registration(&request)?;
        let email = normalize_email(&request.email);

        if self
            .employee_repository
            .find_by_email(&email)
            .await?
            .is_some()
        {
            return Err(AuthError::EmailTaken);
        }

        let role = if self.employee_repository.count().await? == 0 {
            EmployeeRole::Manager
        } else {
            EmployeeRole::Dispatcher
        };

        let password_hash = hash(&request.password, DEFAULT_COST).map_err(|e| anyhow!(e))?;

        let employee = self
            .employee_repository
            .create(NewEmployee {
                email,
                password_hash,
                full_name: request.full_name.trim().to_string(),
                role,
                badge_number: request.badge_number,
            })
            .await
            .map_err(|e| {
                // Lost a race with a concurrent registration of the same email
                if is_unique_violation(&e) {
                    AuthError::EmailTaken
                } else {
                    AuthError::Other(e)
                }
            })?;

        log::info!("Registered employee {} as {}", employee.id, employee.role);

        let token = self.generate_token(&employee)?;
        Ok(AuthResponse {
            token,
            employee: employee.into(),
        })
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let employee = self
            .employee_repository
            .find_by_email(&normalize_email(&request.email))
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify(&request.password, &employee.password_hash).map_err(|e| anyhow!(e))? {
            return Err(AuthError::InvalidCredentials);
        }
        if !employee.is_active {
            return Err(AuthError::Inactive);
        }

        let token = self.generate_token(&employee)?;
        Ok(AuthResponse {
            token,
            employee: employee.into(),
        })
    }

    pub fn generate_token(&self, employee: &Employee) -> Result<String, AuthError> {
        let expiration = Utc::now()
            .checked_add_signed(Duration::days(self.config.jwt_expiration_days))
            .ok_or_else(|| anyhow!("token expiration overflows"))?
            .timestamp() as usize;

        let claims = Claims {
            sub: employee.id,
            email: employee.email.clone(),
            role: employee.role,
            exp: expiration,
        };

        Ok(encode_token(&claims, &self.config.jwt_secret).map_err(|e| anyhow!(e))?)
    }
}

/// Emails are stored trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_unique_violation(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<sqlx::Error>(),
        Some(sqlx::Error::Database(db)) if db.is_unique_violation()
    )
}

pub fn validate_registration(request: &RegisterRequest) -> Result<(), AuthError> {
    let email = request.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AuthError::InvalidInput("A valid email is required".to_string()));
    }
    if request.full_name.trim().is_empty() {
        return Err(AuthError::InvalidInput("Full name is required".to_string()));
    }
    if request.password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::InvalidInput(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}
