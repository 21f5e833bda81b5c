//! Router assembly

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::handlers::{activity_stream, booking_wizard, bookings, health, pra, pra_wizard};
use crate::middleware::{require_user, session_layer};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/pingdom/ping.xml", get(health::pingdom))
        .route("/activity-stream/bookings", get(activity_stream::bookings_feed))
        .route("/activity-stream/pras", get(activity_stream::pras_feed));

    let booking = Router::new()
        .route("/", get(bookings::my_bookings))
        .route("/bookings", get(bookings::my_bookings))
        .route("/buildings", get(bookings::list_buildings))
        .route("/dit-groups", get(bookings::list_dit_groups))
        .route(
            "/booking/create/who-for",
            get(booking_wizard::who_for_page).post(booking_wizard::who_for_submit),
        )
        .route(
            "/booking/create/details",
            get(booking_wizard::details_page).post(booking_wizard::details_submit),
        )
        .route(
            "/booking/create/business-unit",
            get(booking_wizard::business_unit_page).post(booking_wizard::business_unit_submit),
        )
        .route(
            "/booking/create/finalize",
            get(booking_wizard::finalize_page).post(booking_wizard::finalize_submit),
        )
        .route("/booking/{id}/cancel", post(bookings::cancel_booking));

    let pra = Router::new()
        .route(
            "/pra/create/initial",
            get(pra_wizard::initial_page).post(pra_wizard::initial_submit),
        )
        .route(
            "/pra/create/business-unit",
            get(pra_wizard::business_unit_page).post(pra_wizard::business_unit_submit),
        )
        .route(
            "/pra/create/reason",
            get(pra_wizard::reason_page).post(pra_wizard::reason_submit),
        )
        .route(
            "/pra/create/risk-category",
            get(pra_wizard::risk_category_page).post(pra_wizard::risk_category_submit),
        )
        .route(
            "/pra/create/prefer-not-to-say",
            get(pra_wizard::prefer_not_to_say_page).post(pra_wizard::prefer_not_to_say_submit),
        )
        .route(
            "/pra/create/mitigation",
            get(pra_wizard::mitigation_page).post(pra_wizard::mitigation_submit),
        )
        .route(
            "/pra/create/mitigation-approve",
            get(pra_wizard::mitigation_approve_page).post(pra_wizard::mitigation_approve_submit),
        )
        .route(
            "/pra/create/mitigation-do-not-approve",
            get(pra_wizard::mitigation_do_not_approve_page)
                .post(pra_wizard::mitigation_do_not_approve_submit),
        )
        .route("/pra/thanks", get(pra_wizard::thanks))
        .route("/pra/{id}", get(pra::show_pra))
        .route("/pra/{id}/staff-member/{decision}", post(pra::staff_member_decision))
        .route("/pra/{id}/scs/{decision}", post(pra::scs_decision));

    // layers run bottom-up: the user is authenticated before the session loads
    let protected = booking
        .merge(pra)
        .layer(from_fn_with_state(state.clone(), session_layer))
        .layer(from_fn_with_state(state.clone(), require_user));

    public
        .merge(protected)
        .with_state(state)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
