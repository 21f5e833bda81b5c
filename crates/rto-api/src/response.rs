//! API Response wrapper

use chrono::Utc;
use rto_core::FieldError;
use serde::Serialize;

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ErrorBody>,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

/// Where the client goes after a successful wizard step.
#[derive(Debug, Serialize)]
pub struct NextStep {
    pub next: String,
}

impl NextStep {
    pub fn to(path: impl Into<String>) -> Self {
        Self { next: path.into() }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn error(code: &str, message: &str) -> Self {
        Self::error_with_fields(code, message, Vec::new())
    }

    pub fn error_with_fields(code: &str, message: &str, fields: Vec<FieldError>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorBody {
                code: code.to_string(),
                message: message.to_string(),
                fields,
            }),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}
