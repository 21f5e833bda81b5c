// ============================================================================
// RTO API - Activity Stream Handlers
// File: crates/rto-api/src/handlers/activity_stream.rs
// ============================================================================
//! Hawk-authenticated feeds of bookings and PRAs for the data workspace.

use axum::{
    extract::{Query, State},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, HOST},
        HeaderMap, HeaderValue, Method, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
};
use chrono::Utc;
use rto_core::services::ActivityPage;
use rto_core::DomainError;
use rto_security::hawk::HawkArtifacts;
use rto_security::HawkRequest;
use serde::Deserialize;
use tracing::{error, warn};

use crate::error::ApiError;
use crate::state::AppState;

const JSON_CONTENT_TYPE: &str = "application/json";
const SERVER_AUTHORIZATION: &str = "server-authorization";

#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub cursor: Option<String>,
}

/// Splits the `Host` header into host and port. Without an explicit port the
/// scheme default applies, taking a TLS-terminating proxy into account.
fn host_and_port(headers: &HeaderMap) -> (String, u16) {
    let host = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let default_port = match headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
    {
        Some(proto) if proto.eq_ignore_ascii_case("https") => 443,
        _ => 80,
    };

    match host.rsplit_once(':') {
        Some((name, port)) => match port.parse() {
            Ok(port) => (name.to_string(), port),
            Err(_) => (host.to_string(), default_port),
        },
        None => (host.to_string(), default_port),
    }
}

fn authenticate(
    state: &AppState,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
) -> Result<HawkArtifacts, ApiError> {
    let (host, port) = host_and_port(headers);
    let resource = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let request = HawkRequest {
        method: method.as_str(),
        resource,
        host: &host,
        port,
        content_type,
        body: &[],
    };
    let authorization = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());

    state
        .hawk
        .authenticate(authorization, &request, Utc::now().timestamp())
        .map_err(|e| {
            warn!("Activity stream request refused: {}", e);
            ApiError::Forbidden("Incorrect authentication credentials".to_string())
        })
}

/// Renders the page as a Collection and signs the response for the client.
fn signed_response(
    state: &AppState,
    artifacts: &HawkArtifacts,
    page: ActivityPage,
    path: &str,
) -> Result<Response, ApiError> {
    let collection = page.into_collection(&format!("{}{}", state.settings.base_url, path));
    let body = serde_json::to_vec(&collection)
        .map_err(|e| ApiError::InternalError(format!("activity stream serialization: {}", e)))?;

    let server_authorization = state
        .hawk
        .response_header(artifacts, JSON_CONTENT_TYPE, &body)
        .map_err(|e| ApiError::InternalError(e.to_string()))
        .and_then(|value| {
            HeaderValue::try_from(value).map_err(|e| ApiError::InternalError(e.to_string()))
        })
        .inspect_err(|e| error!("Failed to sign activity stream response: {}", e))?;

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE)),
            (
                axum::http::HeaderName::from_static(SERVER_AUTHORIZATION),
                server_authorization,
            ),
        ],
        body,
    )
        .into_response())
}

async fn feed<F, Fut>(
    state: AppState,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    query: FeedQuery,
    load: F,
) -> Result<Response, ApiError>
where
    F: FnOnce(AppState, Option<String>) -> Fut,
    Fut: std::future::Future<Output = Result<ActivityPage, DomainError>>,
{
    let artifacts = authenticate(&state, &method, &uri, &headers)?;
    let page = load(state.clone(), query.cursor).await?;
    signed_response(&state, &artifacts, page, uri.path())
}

/// GET /activity-stream/bookings
pub async fn bookings_feed(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<FeedQuery>,
) -> Result<Response, ApiError> {
    feed(state, method, uri, headers, query, |state, cursor| async move {
        state.activity_stream.bookings_page(cursor.as_deref()).await
    })
    .await
}

/// GET /activity-stream/pras
pub async fn pras_feed(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<FeedQuery>,
) -> Result<Response, ApiError> {
    feed(state, method, uri, headers, query, |state, cursor| async move {
        state.activity_stream.pras_page(cursor.as_deref()).await
    })
    .await
}
