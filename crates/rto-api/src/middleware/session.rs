//! Server-side sessions
//!
//! The cookie only carries a random key; wizard answers live in the
//! session store. The session is written back only when a handler changed it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::SET_COOKIE, request::Parts, HeaderValue},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use cookie::{Cookie, SameSite};
use rto_core::repositories::SessionData;
use rto_core::wizard::WizardState;
use rto_security::session::{generate_session_key, is_well_formed_session_key};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, warn};

use super::cookie_value;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Default)]
struct SessionInner {
    data: SessionData,
    modified: bool,
}

/// Handle to the current request's session data.
#[derive(Clone, Default)]
pub struct Session {
    inner: Arc<Mutex<SessionInner>>,
}

impl Session {
    fn new(data: SessionData) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionInner {
                data,
                modified: false,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.lock().data.get(key).cloned()?;
        match serde_json::from_value(value) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Discarding unreadable session value '{}': {}", key, e);
                None
            }
        }
    }

    pub fn insert<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ApiError> {
        let value = serde_json::to_value(value)
            .map_err(|e| ApiError::InternalError(format!("session serialization: {}", e)))?;
        let mut inner = self.lock();
        inner.data.insert(key.to_string(), value);
        inner.modified = true;
        Ok(())
    }

    pub fn remove(&self, key: &str) {
        let mut inner = self.lock();
        if inner.data.remove(key).is_some() {
            inner.modified = true;
        }
    }

    /// The wizard's saved answers, or a fresh wizard.
    pub fn wizard<W: WizardState>(&self) -> W {
        self.get(W::SESSION_KEY).unwrap_or_default()
    }

    pub fn save_wizard<W: WizardState>(&self, wizard: &W) -> Result<(), ApiError> {
        self.insert(W::SESSION_KEY, wizard)
    }

    pub fn clear_wizard<W: WizardState>(&self) {
        self.remove(W::SESSION_KEY);
    }

    fn take_if_modified(&self) -> Option<SessionData> {
        let inner = self.lock();
        inner.modified.then(|| inner.data.clone())
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| ApiError::InternalError("session layer not installed".to_string()))
    }
}

pub async fn session_layer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let now = Utc::now();
    let settings = &state.settings;

    let key = cookie_value(request.headers(), &settings.session_cookie_name)
        .filter(|key| is_well_formed_session_key(key));
    let (key, data) = match key {
        Some(key) => match state.sessions.load(&key, now).await? {
            Some(data) => (Some(key), data),
            None => (None, SessionData::new()),
        },
        None => (None, SessionData::new()),
    };

    let session = Session::new(data);
    request.extensions_mut().insert(session.clone());
    let mut response = next.run(request).await;

    let Some(data) = session.take_if_modified() else {
        return Ok(response);
    };
    let key = key.unwrap_or_else(generate_session_key);

    let stored = if data.is_empty() {
        state.sessions.delete(&key).await
    } else {
        let expire_date = now + Duration::hours(settings.session_ttl_hours);
        state.sessions.save(&key, &data, expire_date).await
    };
    if let Err(e) = stored {
        error!("Failed to store session: {}", e);
        return Ok(response);
    }

    let cookie = Cookie::build((settings.session_cookie_name.clone(), key))
        .path("/")
        .http_only(true)
        .secure(settings.secure_cookie)
        .same_site(SameSite::Lax)
        .build();
    match HeaderValue::try_from(cookie.to_string()) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(e) => error!("Invalid session cookie header: {}", e),
    }

    Ok(response)
}
