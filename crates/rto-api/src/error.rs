//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rto_core::{DomainError, FieldError};
use thiserror::Error;
use tracing::{error, warn};

use crate::response::ApiResponse;

const INTERNAL_MESSAGE: &str = "Something went wrong, please try again later";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            DomainError::PermissionDenied(msg) => ApiError::Forbidden(msg),
            DomainError::FloorFullyBooked => ApiError::Conflict(err.to_string()),
            DomainError::InvalidTransition(msg) => ApiError::Conflict(msg),
            DomainError::Validation(fields) => ApiError::Validation(fields),
            DomainError::MissingWizardStep(step) => {
                ApiError::BadRequest(format!("Complete the '{}' step first", step))
            }
            DomainError::NotificationError(_)
            | DomainError::DatabaseError(_)
            | DomainError::InternalError(_) => ApiError::InternalError(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Unauthorized(msg) => {
                warn!("Unauthorized: {}", msg);
                (
                    StatusCode::UNAUTHORIZED,
                    ApiResponse::<()>::error("UNAUTHORIZED", &msg),
                )
            }
            ApiError::Forbidden(msg) => {
                warn!("Forbidden: {}", msg);
                (StatusCode::FORBIDDEN, ApiResponse::error("FORBIDDEN", &msg))
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiResponse::error("NOT_FOUND", &msg)),
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiResponse::error("BAD_REQUEST", &msg))
            }
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, ApiResponse::error("CONFLICT", &msg)),
            ApiError::Validation(fields) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiResponse::error_with_fields(
                    "VALIDATION_ERROR",
                    "Please correct the errors below",
                    fields,
                ),
            ),
            ApiError::InternalError(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::error("INTERNAL_ERROR", INTERNAL_MESSAGE),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: DomainError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_domain_errors_map_to_status_codes() {
        assert_eq!(status_of(DomainError::NotFound("PRA 1".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(DomainError::PermissionDenied("no".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status_of(DomainError::FloorFullyBooked), StatusCode::CONFLICT);
        assert_eq!(
            status_of(DomainError::InvalidTransition("done".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(DomainError::validation("booking_date", "past")),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(DomainError::MissingWizardStep("who-for".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DomainError::DatabaseError("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
