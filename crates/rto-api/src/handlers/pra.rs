//! PRA detail page and approval decisions

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use rto_core::domain::User;

use crate::dto::pra::{Decision, PraDetail};
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::response::ApiResponse;
use crate::state::AppState;

/// GET /pra/{id}: visible to the staff member, line manager and SCS only.
pub async fn show_pra(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<PraDetail>>, ApiError> {
    let view = state.pras.view(&user, id, Utc::now()).await?;
    Ok(Json(ApiResponse::success(PraDetail::from(&view))))
}

fn parse_decision(decision: &str) -> Result<bool, ApiError> {
    match decision {
        "approve" => Ok(true),
        "reject" => Ok(false),
        other => Err(ApiError::NotFound(format!("Unknown decision '{}'", other))),
    }
}

async fn decision_response(
    state: &AppState,
    user: &User,
    id: i64,
) -> Result<Json<ApiResponse<Decision>>, ApiError> {
    let view = state.pras.view(user, id, Utc::now()).await?;
    Ok(Json(ApiResponse::success(Decision {
        id,
        status: view.status.as_str().to_string(),
    })))
}

/// POST /pra/{id}/staff-member/{approve|reject}
pub async fn staff_member_decision(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, decision)): Path<(i64, String)>,
) -> Result<Json<ApiResponse<Decision>>, ApiError> {
    let approve = parse_decision(&decision)?;
    state
        .pras
        .record_staff_member_decision(&user, id, approve, Utc::now())
        .await?;
    decision_response(&state, &user, id).await
}

/// POST /pra/{id}/scs/{approve|reject}
pub async fn scs_decision(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, decision)): Path<(i64, String)>,
) -> Result<Json<ApiResponse<Decision>>, ApiError> {
    let approve = parse_decision(&decision)?;
    state
        .pras
        .record_scs_decision(&user, id, approve, Utc::now())
        .await?;
    decision_response(&state, &user, id).await
}
