//! Booking list, cancellation and reference data

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use rto_core::domain::Building;
use rto_core::wizard::BookingStep;

use crate::dto::booking::{BookingView, CancelledBooking, DitGroupView, MyBookings, UserView};
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::response::ApiResponse;
use crate::state::AppState;

/// GET / and GET /bookings: the user's bookings from today on.
pub async fn my_bookings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<MyBookings>>, ApiError> {
    let today = Utc::now().date_naive();
    let bookings = state.bookings.upcoming_bookings(&user, today).await?;

    Ok(Json(ApiResponse::success(MyBookings {
        user: UserView::from(&user),
        bookings: bookings.iter().map(BookingView::from).collect(),
    })))
}

/// POST /booking/{id}/cancel
pub async fn cancel_booking(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<CancelledBooking>>, ApiError> {
    let booking = state.bookings.cancel_booking(&user, id, Utc::now()).await?;
    Ok(Json(ApiResponse::success(CancelledBooking::new(
        BookingStep::Done.path(),
        &booking,
    ))))
}

pub async fn list_buildings(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Building>>>, ApiError> {
    Ok(Json(ApiResponse::success(state.bookings.buildings().await?)))
}

pub async fn list_dit_groups(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<DitGroupView>>>, ApiError> {
    let groups = state.bookings.dit_groups().await?;
    Ok(Json(ApiResponse::success(
        groups.iter().map(DitGroupView::from).collect(),
    )))
}
