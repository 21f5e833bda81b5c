// ============================================================================
// RTO API - SSO Authentication Middleware
// File: crates/rto-api/src/middleware/auth.rs
// ============================================================================
//! Every non-anonymous route runs behind `require_user`. The SSO broker's
//! token arrives either as a bearer token or in a cookie.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use rto_core::domain::{SsoProfile, User};
use rto_shared::utils::normalize_email;
use tracing::{debug, warn};

use super::cookie_value;
use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated user, placed in request extensions by `require_user`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Not signed in".to_string()))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .or_else(|| cookie_value(request.headers(), &state.settings.sso_cookie_name))
        .ok_or_else(|| ApiError::Unauthorized("Missing SSO token".to_string()))?;

    let claims = state.sso.verify(&token).map_err(|e| {
        warn!("Rejected SSO token: {}", e);
        ApiError::Unauthorized("Invalid SSO token".to_string())
    })?;

    let profile = SsoProfile {
        email: normalize_email(&claims.email),
        first_name: claims.first_name,
        last_name: claims.last_name,
        contact_email: normalize_email(&claims.contact_email),
    };
    let user = state.users.get_or_create(&profile, Utc::now()).await?;
    if !user.is_active {
        return Err(ApiError::Forbidden("This account has been deactivated".to_string()));
    }

    debug!("Request authenticated as user {}", user.id);
    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}
