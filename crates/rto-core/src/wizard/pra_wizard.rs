//! PRA wizard
//!
//! initial → business unit → reason → risk category, then depending on the
//! risk category either a confirmation step, the mitigation steps, or
//! straight to submission.

use serde::{Deserialize, Serialize};

use super::WizardState;
use crate::domain::{MitigationOutcome, RiskCategory};
use crate::error::DomainError;
use crate::services::pra_service::PraSubmission;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PraStep {
    Initial,
    BusinessUnit,
    Reason,
    RiskCategory,
    PreferNotToSay,
    Mitigation,
    MitigationApprove,
    MitigationDoNotApprove,
    /// All answers collected; the caller submits the PRA.
    Submit,
    Thanks,
}

impl PraStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            PraStep::Initial => "initial",
            PraStep::BusinessUnit => "business-unit",
            PraStep::Reason => "reason",
            PraStep::RiskCategory => "risk-category",
            PraStep::PreferNotToSay => "prefer-not-to-say",
            PraStep::Mitigation => "mitigation",
            PraStep::MitigationApprove => "mitigation-approve",
            PraStep::MitigationDoNotApprove => "mitigation-do-not-approve",
            PraStep::Submit => "submit",
            PraStep::Thanks => "thanks",
        }
    }

    pub fn path(&self) -> String {
        match self {
            PraStep::Thanks => "/pra/thanks".to_string(),
            step => format!("/pra/create/{}", step.as_str()),
        }
    }
}

fn missing(step: PraStep) -> DomainError {
    DomainError::MissingWizardStep(step.as_str().to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PraWizard {
    pub staff_member_email: Option<String>,
    pub scs_email: Option<String>,
    pub dit_group_id: Option<i64>,
    pub business_unit: Option<String>,
    pub authorized_reason: Option<String>,
    pub risk_category: Option<RiskCategory>,
    pub mitigation_outcome: Option<MitigationOutcome>,
    pub mitigation_measures: Option<String>,
}

impl WizardState for PraWizard {
    const SESSION_KEY: &'static str = "pra_wizard";
}

impl PraWizard {
    /// Fails with `MissingWizardStep` naming the earliest step whose answer
    /// `step` depends on.
    pub fn ensure_reached(&self, step: PraStep) -> Result<(), DomainError> {
        if step == PraStep::Initial {
            return Ok(());
        }
        if self.staff_member_email.is_none() || self.scs_email.is_none() || self.dit_group_id.is_none()
        {
            return Err(missing(PraStep::Initial));
        }
        if step == PraStep::BusinessUnit {
            return Ok(());
        }
        if self.business_unit.is_none() {
            return Err(missing(PraStep::BusinessUnit));
        }
        if step == PraStep::Reason {
            return Ok(());
        }
        if self.authorized_reason.is_none() {
            return Err(missing(PraStep::Reason));
        }
        if step == PraStep::RiskCategory {
            return Ok(());
        }

        let risk = self.risk_category.ok_or_else(|| missing(PraStep::RiskCategory))?;
        match step {
            PraStep::PreferNotToSay if risk != RiskCategory::PreferNotToSay => {
                Err(missing(PraStep::RiskCategory))
            }
            PraStep::Mitigation if !risk.requires_mitigation() => {
                Err(missing(PraStep::RiskCategory))
            }
            PraStep::MitigationApprove | PraStep::MitigationDoNotApprove => {
                if !risk.requires_mitigation() {
                    return Err(missing(PraStep::RiskCategory));
                }
                let expected = if step == PraStep::MitigationApprove {
                    MitigationOutcome::ApproveMitigationRequired
                } else {
                    MitigationOutcome::DoNotApprove
                };
                if self.mitigation_outcome != Some(expected) {
                    return Err(missing(PraStep::Mitigation));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn record_initial(
        &mut self,
        staff_member_email: &str,
        scs_email: &str,
        dit_group_id: i64,
    ) -> PraStep {
        if self.dit_group_id != Some(dit_group_id) {
            self.business_unit = None;
        }
        self.staff_member_email = Some(staff_member_email.trim().to_string());
        self.scs_email = Some(scs_email.trim().to_string());
        self.dit_group_id = Some(dit_group_id);
        PraStep::BusinessUnit
    }

    pub fn record_business_unit(&mut self, business_unit: &str) -> Result<PraStep, DomainError> {
        self.ensure_reached(PraStep::BusinessUnit)?;
        self.business_unit = Some(business_unit.to_string());
        Ok(PraStep::Reason)
    }

    pub fn record_reason(&mut self, authorized_reason: &str) -> Result<PraStep, DomainError> {
        self.ensure_reached(PraStep::Reason)?;
        self.authorized_reason = Some(authorized_reason.to_string());
        Ok(PraStep::RiskCategory)
    }

    pub fn record_risk_category(&mut self, risk: RiskCategory) -> Result<PraStep, DomainError> {
        self.ensure_reached(PraStep::RiskCategory)?;

        self.risk_category = Some(risk);
        if !risk.requires_mitigation() {
            self.mitigation_outcome = None;
            self.mitigation_measures = None;
        }

        Ok(match risk {
            RiskCategory::PreferNotToSay => PraStep::PreferNotToSay,
            r if r.requires_mitigation() => PraStep::Mitigation,
            _ => PraStep::Submit,
        })
    }

    pub fn confirm_prefer_not_to_say(&self) -> Result<PraStep, DomainError> {
        self.ensure_reached(PraStep::PreferNotToSay)?;
        Ok(PraStep::Submit)
    }

    pub fn record_mitigation_outcome(
        &mut self,
        outcome: MitigationOutcome,
    ) -> Result<PraStep, DomainError> {
        self.ensure_reached(PraStep::Mitigation)?;

        if self.mitigation_outcome != Some(outcome) {
            self.mitigation_measures = None;
        }
        self.mitigation_outcome = Some(outcome);

        Ok(match outcome {
            MitigationOutcome::ApproveNoMitigation => PraStep::Submit,
            MitigationOutcome::ApproveMitigationRequired => PraStep::MitigationApprove,
            MitigationOutcome::DoNotApprove => PraStep::MitigationDoNotApprove,
        })
    }

    pub fn record_mitigation_measures(&mut self, measures: &str) -> Result<PraStep, DomainError> {
        let step = match self.mitigation_outcome {
            Some(MitigationOutcome::DoNotApprove) => PraStep::MitigationDoNotApprove,
            _ => PraStep::MitigationApprove,
        };
        self.ensure_reached(step)?;

        let measures = measures.trim();
        if measures.is_empty() {
            return Err(DomainError::validation(
                "mitigation_measures",
                "Describe the mitigation measures",
            ));
        }
        self.mitigation_measures = Some(measures.to_string());
        Ok(PraStep::Submit)
    }

    /// Collects the answers into a submission, checking that the path taken
    /// through the wizard is complete.
    pub fn submission(&self) -> Result<PraSubmission, DomainError> {
        self.ensure_reached(PraStep::RiskCategory)?;
        let risk_category = self.risk_category.ok_or_else(|| missing(PraStep::RiskCategory))?;

        let (mitigation_outcome, mitigation_measures) = if risk_category.requires_mitigation() {
            let outcome = self
                .mitigation_outcome
                .ok_or_else(|| missing(PraStep::Mitigation))?;
            let measures = if outcome.requires_measures() {
                let step = if outcome == MitigationOutcome::DoNotApprove {
                    PraStep::MitigationDoNotApprove
                } else {
                    PraStep::MitigationApprove
                };
                self.mitigation_measures
                    .clone()
                    .ok_or_else(|| missing(step))?
            } else {
                String::new()
            };
            (Some(outcome), measures)
        } else {
            (None, String::new())
        };

        match (
            &self.staff_member_email,
            &self.scs_email,
            self.dit_group_id,
            &self.business_unit,
            &self.authorized_reason,
        ) {
            (Some(staff), Some(scs), Some(group), Some(bu), Some(reason)) => Ok(PraSubmission {
                staff_member_email: staff.clone(),
                scs_email: scs.clone(),
                dit_group_id: group,
                business_unit: bu.clone(),
                authorized_reason: reason.clone(),
                risk_category,
                mitigation_outcome,
                mitigation_measures,
            }),
            _ => Err(missing(PraStep::Initial)),
        }
    }
}
