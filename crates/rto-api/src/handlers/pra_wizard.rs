// ============================================================================
// RTO API - PRA Wizard Handlers
// File: crates/rto-api/src/handlers/pra_wizard.rs
// ============================================================================
//! The line manager's personal risk assessment form. The PRA is submitted
//! as soon as a step leaves nothing more to ask.

use axum::{
    extract::{Query, State},
    Json,
};
use rto_core::domain::{AuthorizedReason, MitigationOutcome, RiskCategory, User};
use rto_core::wizard::{PraStep, PraWizard};
use rto_core::DomainError;
use tracing::info;

use crate::dto::booking::DitGroupView;
use crate::dto::pra::{
    BusinessUnitForm, ChoiceStep, InitialForm, InitialStep, MeasuresForm, MeasuresStep,
    MitigationForm, PreferNotToSayStep, ReasonForm, RiskCategoryForm, Thanks,
};
use crate::dto::{ApiForm, Choice, StepQuery};
use crate::error::ApiError;
use crate::middleware::{CurrentUser, Session};
use crate::response::{ApiResponse, NextStep};
use crate::state::AppState;

/// Session key holding the id of the PRA the user just submitted.
const SUBMITTED_PRA_KEY: &str = "submitted_pra_id";

type StepResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Saves the wizard and points at `step`, or submits the PRA when the
/// wizard is complete.
async fn advance(
    state: &AppState,
    user: &User,
    session: &Session,
    wizard: &PraWizard,
    step: PraStep,
) -> StepResult<NextStep> {
    if step != PraStep::Submit {
        session.save_wizard(wizard)?;
        return Ok(Json(ApiResponse::success(NextStep::to(step.path()))));
    }

    let submission = wizard.submission()?;
    let pra = state.pras.submit(user, &submission).await?;
    info!("PRA {} submitted through the wizard", pra.id);

    session.clear_wizard::<PraWizard>();
    session.insert(SUBMITTED_PRA_KEY, &pra.id)?;
    Ok(Json(ApiResponse::success(NextStep::to(
        PraStep::Thanks.path(),
    ))))
}

fn dit_group_id(wizard: &PraWizard) -> Result<i64, DomainError> {
    wizard
        .dit_group_id
        .ok_or_else(|| DomainError::MissingWizardStep(PraStep::Initial.as_str().to_string()))
}

/// GET /pra/create/initial. Starts over unless `?back=1`.
pub async fn initial_page(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<StepQuery>,
) -> StepResult<InitialStep> {
    if !query.is_back() {
        session.clear_wizard::<PraWizard>();
    }
    let wizard: PraWizard = session.wizard();
    let groups = state.bookings.dit_groups().await?;

    Ok(Json(ApiResponse::success(InitialStep {
        dit_groups: groups.iter().map(DitGroupView::from).collect(),
        staff_member_email: wizard.staff_member_email,
        scs_email: wizard.scs_email,
        dit_group: wizard.dit_group_id,
    })))
}

pub async fn initial_submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    session: Session,
    ApiForm(form): ApiForm<InitialForm>,
) -> StepResult<NextStep> {
    let staff_member_email = form.staff_member_email.trim();
    let scs_email = form.scs_email.trim();
    state
        .pras
        .validate_initial(staff_member_email, scs_email, form.dit_group)
        .await?;

    let mut wizard: PraWizard = session.wizard();
    let step = wizard.record_initial(staff_member_email, scs_email, form.dit_group);
    advance(&state, &user, &session, &wizard, step).await
}

pub async fn business_unit_page(
    State(state): State<AppState>,
    session: Session,
) -> StepResult<ChoiceStep> {
    let wizard: PraWizard = session.wizard();
    wizard.ensure_reached(PraStep::BusinessUnit)?;

    let group = state.bookings.dit_group(dit_group_id(&wizard)?).await?;
    Ok(Json(ApiResponse::success(ChoiceStep {
        choices: group
            .business_units()
            .into_iter()
            .map(|unit| Choice::new(unit.clone(), unit))
            .collect(),
        selected: wizard.business_unit,
    })))
}

pub async fn business_unit_submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    session: Session,
    ApiForm(form): ApiForm<BusinessUnitForm>,
) -> StepResult<NextStep> {
    let mut wizard: PraWizard = session.wizard();
    wizard.ensure_reached(PraStep::BusinessUnit)?;
    state
        .bookings
        .validate_business_unit(dit_group_id(&wizard)?, &form.business_unit)
        .await?;

    let step = wizard.record_business_unit(&form.business_unit)?;
    advance(&state, &user, &session, &wizard, step).await
}

pub async fn reason_page(session: Session) -> StepResult<ChoiceStep> {
    let wizard: PraWizard = session.wizard();
    wizard.ensure_reached(PraStep::Reason)?;

    Ok(Json(ApiResponse::success(ChoiceStep {
        choices: AuthorizedReason::ALL
            .iter()
            .map(|r| Choice::new(r.as_str(), r.as_str()))
            .collect(),
        selected: wizard.authorized_reason,
    })))
}

pub async fn reason_submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    session: Session,
    ApiForm(form): ApiForm<ReasonForm>,
) -> StepResult<NextStep> {
    let reason = AuthorizedReason::from_str(form.authorized_reason.trim()).ok_or_else(|| {
        DomainError::validation("authorized_reason", "Select an authorised reason")
    })?;

    let mut wizard: PraWizard = session.wizard();
    let step = wizard.record_reason(reason.as_str())?;
    advance(&state, &user, &session, &wizard, step).await
}

pub async fn risk_category_page(session: Session) -> StepResult<ChoiceStep> {
    let wizard: PraWizard = session.wizard();
    wizard.ensure_reached(PraStep::RiskCategory)?;

    Ok(Json(ApiResponse::success(ChoiceStep {
        choices: RiskCategory::ALL
            .iter()
            .map(|c| Choice::new(c.as_str(), c.description()))
            .collect(),
        selected: wizard.risk_category.map(|c| c.as_str().to_string()),
    })))
}

pub async fn risk_category_submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    session: Session,
    ApiForm(form): ApiForm<RiskCategoryForm>,
) -> StepResult<NextStep> {
    let risk = RiskCategory::from_str(form.risk_category.trim())
        .ok_or_else(|| DomainError::validation("risk_category", "Select a risk category"))?;

    let mut wizard: PraWizard = session.wizard();
    let step = wizard.record_risk_category(risk)?;
    advance(&state, &user, &session, &wizard, step).await
}

pub async fn prefer_not_to_say_page(session: Session) -> StepResult<PreferNotToSayStep> {
    let wizard: PraWizard = session.wizard();
    wizard.ensure_reached(PraStep::PreferNotToSay)?;

    let risk = RiskCategory::PreferNotToSay;
    Ok(Json(ApiResponse::success(PreferNotToSayStep {
        risk_category: risk.as_str().to_string(),
        description: risk.description().to_string(),
    })))
}

pub async fn prefer_not_to_say_submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    session: Session,
) -> StepResult<NextStep> {
    let wizard: PraWizard = session.wizard();
    let step = wizard.confirm_prefer_not_to_say()?;
    advance(&state, &user, &session, &wizard, step).await
}

pub async fn mitigation_page(session: Session) -> StepResult<ChoiceStep> {
    let wizard: PraWizard = session.wizard();
    wizard.ensure_reached(PraStep::Mitigation)?;

    Ok(Json(ApiResponse::success(ChoiceStep {
        choices: MitigationOutcome::ALL
            .iter()
            .map(|o| Choice::new(o.as_str(), o.description()))
            .collect(),
        selected: wizard.mitigation_outcome.map(|o| o.as_str().to_string()),
    })))
}

pub async fn mitigation_submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    session: Session,
    ApiForm(form): ApiForm<MitigationForm>,
) -> StepResult<NextStep> {
    let outcome = MitigationOutcome::from_str(form.mitigation_outcome.trim()).ok_or_else(|| {
        DomainError::validation("mitigation_outcome", "Select a mitigation outcome")
    })?;

    let mut wizard: PraWizard = session.wizard();
    let step = wizard.record_mitigation_outcome(outcome)?;
    advance(&state, &user, &session, &wizard, step).await
}

fn measures_page(session: &Session, step: PraStep) -> StepResult<MeasuresStep> {
    let wizard: PraWizard = session.wizard();
    wizard.ensure_reached(step)?;

    Ok(Json(ApiResponse::success(MeasuresStep {
        mitigation_outcome: wizard
            .mitigation_outcome
            .map(|o| o.as_str().to_string())
            .unwrap_or_default(),
        mitigation_measures: wizard.mitigation_measures,
    })))
}

async fn measures_submit(
    state: &AppState,
    user: &User,
    session: &Session,
    step: PraStep,
    measures: &str,
) -> StepResult<NextStep> {
    let mut wizard: PraWizard = session.wizard();
    wizard.ensure_reached(step)?;
    let next = wizard.record_mitigation_measures(measures)?;
    advance(state, user, session, &wizard, next).await
}

pub async fn mitigation_approve_page(session: Session) -> StepResult<MeasuresStep> {
    measures_page(&session, PraStep::MitigationApprove)
}

pub async fn mitigation_approve_submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    session: Session,
    ApiForm(form): ApiForm<MeasuresForm>,
) -> StepResult<NextStep> {
    measures_submit(
        &state,
        &user,
        &session,
        PraStep::MitigationApprove,
        &form.mitigation_measures,
    )
    .await
}

pub async fn mitigation_do_not_approve_page(session: Session) -> StepResult<MeasuresStep> {
    measures_page(&session, PraStep::MitigationDoNotApprove)
}

pub async fn mitigation_do_not_approve_submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    session: Session,
    ApiForm(form): ApiForm<MeasuresForm>,
) -> StepResult<NextStep> {
    measures_submit(
        &state,
        &user,
        &session,
        PraStep::MitigationDoNotApprove,
        &form.mitigation_measures,
    )
    .await
}

/// GET /pra/thanks
pub async fn thanks(State(state): State<AppState>, session: Session) -> StepResult<Thanks> {
    let pra_id: Option<i64> = session.get(SUBMITTED_PRA_KEY);
    Ok(Json(ApiResponse::success(Thanks {
        pra_id,
        link: pra_id.map(|id| state.pras.link(id)),
    })))
}
