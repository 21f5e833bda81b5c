//! Liveness, readiness and Pingdom checks

use std::time::Instant;

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::state::AppState;

const PINGDOM_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<pingdom_http_custom_check>
    <status>{status}</status>
    <response_time>{response_time}</response_time>
</pingdom_http_custom_check>
"#;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
}

pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

pub async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    match state.health.ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            error!("Readiness check failed: {}", e);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Pingdom custom HTTP check. Pingdom only accepts three fractional digits.
pub async fn pingdom(State(state): State<AppState>) -> impl IntoResponse {
    let started = Instant::now();
    let result = state.health.ping().await;
    let response_time = format!("{:.3}", started.elapsed().as_secs_f64());

    let (status, body) = match result {
        Ok(()) => (StatusCode::OK, render_pingdom("OK", &response_time)),
        Err(e) => {
            error!("Pingdom database check failed: {}", e);
            let mut body = render_pingdom("FALSE", &response_time);
            body.push_str(&format!("<!--Database: {}-->\n", e));
            (StatusCode::INTERNAL_SERVER_ERROR, body)
        }
    };

    (status, [(CONTENT_TYPE, "text/xml")], body)
}

fn render_pingdom(status: &str, response_time: &str) -> String {
    PINGDOM_TEMPLATE
        .replace("{status}", status)
        .replace("{response_time}", response_time)
}
