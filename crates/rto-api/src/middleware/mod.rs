//! Request middleware: SSO authentication and server-side sessions

pub mod auth;
pub mod session;

pub use auth::{require_user, CurrentUser};
pub use session::{session_layer, Session};

use axum::http::{header::COOKIE, HeaderMap};
use cookie::Cookie;

/// Value of the named cookie, if the request carries it.
pub(crate) fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .into_iter()
        .filter_map(|value| value.to_str().ok())
        .map(ToOwned::to_owned)
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_owned())
}
