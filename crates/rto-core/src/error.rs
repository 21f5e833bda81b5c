//! Domain errors

use serde::Serialize;
use thiserror::Error;

/// A validation failure. `field` is `None` for errors that concern the whole
/// submission rather than one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: Option<String>,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.to_string()),
            message: message.into(),
        }
    }

    pub fn non_field(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("The floor is completely booked")]
    FloorFullyBooked,

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Validation error: {}", format_field_errors(.0))]
    Validation(Vec<FieldError>),

    #[error("Wizard step missing: {0}")]
    MissingWizardStep(String),

    #[error("Notification error: {0}")]
    NotificationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        DomainError::Validation(vec![FieldError::new(field, message)])
    }
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| match &e.field {
            Some(field) => format!("{}: {}", field, e.message),
            None => e.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}
