// ============================================================================
// RTO API - Booking Wizard Handlers
// File: crates/rto-api/src/handlers/booking_wizard.rs
// ============================================================================
//! who-for → details → business unit → finalize

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use rto_core::wizard::{BookingStep, BookingWizard};
use rto_core::DomainError;

use crate::dto::booking::{
    BookingCreated, BookingView, BusinessUnitForm, BusinessUnitStep, DetailsForm, DetailsStep,
    DitGroupView, FinalizeForm, FinalizeStep, FloorChoice, WhoForForm, WhoForStep,
};
use crate::dto::{ApiForm, StepQuery};
use crate::error::ApiError;
use crate::middleware::{CurrentUser, Session};
use crate::response::{ApiResponse, NextStep};
use crate::state::AppState;

type StepResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn next(step: BookingStep) -> StepResult<NextStep> {
    Ok(Json(ApiResponse::success(NextStep::to(step.path()))))
}

fn parse_date(raw: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| DomainError::validation("booking_date", "Enter a valid date"))
}

/// GET /booking/create/who-for. Starts over unless `?back=1`.
pub async fn who_for_page(
    session: Session,
    Query(query): Query<StepQuery>,
) -> StepResult<WhoForStep> {
    if !query.is_back() {
        session.clear_wizard::<BookingWizard>();
    }
    let wizard: BookingWizard = session.wizard();

    Ok(Json(ApiResponse::success(WhoForStep {
        for_myself: wizard.who_for.as_ref().map(|w| w.is_yourself()),
        on_behalf_of_name: wizard.who_for.as_ref().and_then(|w| w.name.clone()),
        on_behalf_of_dit_email: wizard.who_for.and_then(|w| w.dit_email),
    })))
}

pub async fn who_for_submit(
    session: Session,
    ApiForm(form): ApiForm<WhoForForm>,
) -> StepResult<NextStep> {
    let mut wizard: BookingWizard = session.wizard();
    let step = wizard.record_who_for(
        form.for_myself,
        form.on_behalf_of_name.as_deref(),
        form.on_behalf_of_dit_email.as_deref(),
    )?;
    session.save_wizard(&wizard)?;
    next(step)
}

pub async fn details_page(
    State(state): State<AppState>,
    session: Session,
) -> StepResult<DetailsStep> {
    let wizard: BookingWizard = session.wizard();
    wizard.ensure_reached(BookingStep::Details)?;

    let buildings = state.bookings.buildings().await?;
    let groups = state.bookings.dit_groups().await?;

    Ok(Json(ApiResponse::success(DetailsStep {
        buildings,
        dit_groups: groups.iter().map(DitGroupView::from).collect(),
        booking_date: wizard.booking_date,
        building: wizard.building_id,
        dit_group: wizard.dit_group_id,
    })))
}

pub async fn details_submit(
    State(state): State<AppState>,
    session: Session,
    ApiForm(form): ApiForm<DetailsForm>,
) -> StepResult<NextStep> {
    let mut wizard: BookingWizard = session.wizard();
    wizard.ensure_reached(BookingStep::Details)?;

    let booking_date = parse_date(&form.booking_date)?;
    state
        .bookings
        .validate_details(
            booking_date,
            form.building,
            form.dit_group,
            Utc::now().date_naive(),
        )
        .await?;

    let step = wizard.record_details(booking_date, form.building, form.dit_group)?;
    session.save_wizard(&wizard)?;
    next(step)
}

pub async fn business_unit_page(
    State(state): State<AppState>,
    session: Session,
) -> StepResult<BusinessUnitStep> {
    let wizard: BookingWizard = session.wizard();
    wizard.ensure_reached(BookingStep::BusinessUnit)?;
    let group_id = wizard
        .dit_group_id
        .ok_or_else(|| DomainError::MissingWizardStep(BookingStep::Details.as_str().to_string()))?;

    let group = state.bookings.dit_group(group_id).await?;
    Ok(Json(ApiResponse::success(BusinessUnitStep {
        business_units: group.business_units(),
        dit_group: group.name,
        business_unit: wizard.business_unit,
    })))
}

pub async fn business_unit_submit(
    State(state): State<AppState>,
    session: Session,
    ApiForm(form): ApiForm<BusinessUnitForm>,
) -> StepResult<NextStep> {
    let mut wizard: BookingWizard = session.wizard();
    wizard.ensure_reached(BookingStep::BusinessUnit)?;
    let group_id = wizard
        .dit_group_id
        .ok_or_else(|| DomainError::MissingWizardStep(BookingStep::Details.as_str().to_string()))?;

    state
        .bookings
        .validate_business_unit(group_id, &form.business_unit)
        .await?;

    let step = wizard.record_business_unit(&form.business_unit)?;
    session.save_wizard(&wizard)?;
    next(step)
}

/// GET /booking/create/finalize: floors of the chosen building with free desks.
pub async fn finalize_page(
    State(state): State<AppState>,
    session: Session,
) -> StepResult<FinalizeStep> {
    let wizard: BookingWizard = session.wizard();
    wizard.ensure_reached(BookingStep::Finalize)?;

    let (Some(who_for), Some(booking_date), Some(building_id), Some(business_unit)) = (
        wizard.who_for,
        wizard.booking_date,
        wizard.building_id,
        wizard.business_unit,
    ) else {
        return Err(DomainError::MissingWizardStep(BookingStep::WhoFor.as_str().to_string()).into());
    };
    let floors = state
        .bookings
        .available_floors(building_id, booking_date)
        .await?;

    Ok(Json(ApiResponse::success(FinalizeStep {
        on_behalf_of: who_for.display(),
        booking_date,
        building: building_id,
        business_unit,
        floors: floors.iter().map(FloorChoice::from).collect(),
    })))
}

pub async fn finalize_submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    session: Session,
    ApiForm(form): ApiForm<FinalizeForm>,
) -> StepResult<BookingCreated> {
    let wizard: BookingWizard = session.wizard();
    let request = wizard.booking_request(form.floor)?;

    let details = state
        .bookings
        .create_booking(&user, &request, Utc::now().date_naive())
        .await?;
    session.clear_wizard::<BookingWizard>();

    Ok(Json(ApiResponse::success(BookingCreated {
        next: BookingStep::Done.path().to_string(),
        booking: BookingView::from(&details),
    })))
}
