use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::Value;
use thiserror::Error;

use crate::handlers::shared::ApiResponse;
use crate::schedule::{
    AssignmentConflict, DateOutOfRange, GenerateError, ShiftWindowError, StaffingRuleError, SwapRuleError,
    SwapTransitionError, TimeOffRangeError,
};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A scheduling rule rejected the request; `details` lists what broke.
    #[error("Conflict: {message}")]
    RuleViolation { message: String, details: Value },

    #[error("Internal server error{}", .0.as_ref().map_or("".to_string(), |s| format!(": {}", s)))]
    InternalServerError(Option<String>),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) | AppError::RuleViolation { .. } => StatusCode::CONFLICT,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();

        // Never leak driver messages to clients
        let error_message = match self {
            AppError::DatabaseError(_) => "Database error".to_string(),
            _ => self.to_string(),
        };

        if status_code.is_server_error() {
            log::error!("Request failed with status {}: {}", status_code, self);
        } else {
            log::warn!("Request rejected with status {}: {}", status_code, error_message);
        }

        match self {
            AppError::RuleViolation { details, .. } => HttpResponse::build(status_code)
                .json(ApiResponse::error_with_data(details, &error_message)),
            _ => HttpResponse::build(status_code).json(ApiResponse::<()>::error(&error_message)),
        }
    }
}

impl AppError {
    pub fn internal_server_error_message(message: impl Into<String>) -> Self {
        AppError::InternalServerError(Some(message.into()))
    }

    pub fn internal_server_error() -> Self {
        AppError::InternalServerError(None)
    }

    /// 409 listing every assignment conflict. Falls back to a plain conflict
    /// if the list cannot be serialized.
    pub fn assignment_conflicts(message: &str, conflicts: &[AssignmentConflict]) -> Self {
        let summary = conflicts
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        let message = format!("{message}: {summary}");

        match serde_json::to_value(conflicts) {
            Ok(details) => AppError::RuleViolation { message, details },
            Err(_) => AppError::Conflict(message),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        log::error!("Database error: {}", error);
        AppError::DatabaseError(error)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        log::error!("Anyhow error: {}", error);

        match error.downcast::<sqlx::Error>() {
            Ok(sqlx_err) => AppError::DatabaseError(sqlx_err),
            Err(original_error) => AppError::InternalServerError(Some(original_error.to_string())),
        }
    }
}

macro_rules! bad_request_from {
    ($($rule:ty),* $(,)?) => {
        $(
            impl From<$rule> for AppError {
                fn from(error: $rule) -> Self {
                    AppError::BadRequest(error.to_string())
                }
            }
        )*
    };
}

bad_request_from!(
    DateOutOfRange,
    ShiftWindowError,
    StaffingRuleError,
    TimeOffRangeError,
    GenerateError,
    SwapRuleError,
);

impl From<SwapTransitionError> for AppError {
    fn from(error: SwapTransitionError) -> Self {
        match error {
            SwapTransitionError::AlreadyFinal(_) => AppError::Conflict(error.to_string()),
            SwapTransitionError::NotAllowed { .. } => AppError::Forbidden(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::SwapStatus;
    use crate::schedule::SwapAction;
    use pretty_assertions::assert_eq;

    #[test]
    fn maps_status_codes() {
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::internal_server_error().status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn rule_errors_map_to_bad_request() {
        let err: AppError = ShiftWindowError::EndNotAfterStart.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn swap_transitions_split_between_conflict_and_forbidden() {
        let done: AppError = SwapTransitionError::AlreadyFinal(SwapStatus::Accepted).into();
        assert_eq!(done.status_code(), StatusCode::CONFLICT);

        let denied: AppError = SwapTransitionError::NotAllowed {
            action: SwapAction::Accept,
        }
        .into();
        assert_eq!(denied.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn assignment_conflicts_carry_details() {
        let err = AppError::assignment_conflicts(
            "Cannot assign shift",
            &[AssignmentConflict::OverlappingShift { shift_id: None }],
        );
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        match err {
            AppError::RuleViolation { message, details } => {
                assert!(message.starts_with("Cannot assign shift: overlaps"));
                assert_eq!(details[0]["kind"], "overlappingShift");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
