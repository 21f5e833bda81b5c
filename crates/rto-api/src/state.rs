use std::sync::Arc;

use rto_core::repositories::{HealthRepository, SessionRepository, UserRepository};
use rto_core::services::{ActivityStreamService, BookingService, PraService};
use rto_security::{HawkAuthenticator, SsoTokenVerifier};
use rto_shared::config::AppConfig;

/// HTTP-layer settings taken from the application config.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub base_url: String,
    pub sso_cookie_name: String,
    pub session_cookie_name: String,
    pub session_ttl_hours: i64,
    pub secure_cookie: bool,
}

impl HttpSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.app.base_url.trim_end_matches('/').to_string(),
            sso_cookie_name: config.sso.cookie_name.clone(),
            session_cookie_name: config.session.cookie_name.clone(),
            session_ttl_hours: config.session.ttl_hours,
            secure_cookie: config.session.secure_cookie,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<BookingService>,
    pub pras: Arc<PraService>,
    pub activity_stream: Arc<ActivityStreamService>,
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub health: Arc<dyn HealthRepository>,
    pub sso: Arc<SsoTokenVerifier>,
    pub hawk: Arc<HawkAuthenticator>,
    pub settings: Arc<HttpSettings>,
}
