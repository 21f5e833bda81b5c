//! Request forms and response views

pub mod booking;
pub mod pra;

use axum::{
    extract::{FromRequest, Request},
    Form,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::ApiError;

/// `application/x-www-form-urlencoded` body; malformed bodies become a JSON
/// 400 instead of axum's plain-text rejection.
pub struct ApiForm<T>(pub T);

impl<S, T> FromRequest<S> for ApiForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(value) = Form::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(ApiForm(value))
    }
}

/// `?back=1` on the first wizard step keeps the saved answers.
#[derive(Debug, Default, Deserialize)]
pub struct StepQuery {
    #[serde(default)]
    pub back: Option<String>,
}

impl StepQuery {
    pub fn is_back(&self) -> bool {
        self.back.as_deref().is_some_and(|v| !v.is_empty() && v != "0")
    }
}

/// A value/label pair offered by a choice step.
#[derive(Debug, Serialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl Choice {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}
