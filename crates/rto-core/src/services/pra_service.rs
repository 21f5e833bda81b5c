// ============================================================================
// RTO Core - PRA Service
// File: crates/rto-core/src/services/pra_service.rs
// ============================================================================
//! Personal risk assessment submission and the staff member / SCS approvals

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rto_shared::utils::mask_email;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::ValidateEmail;

use super::dispatch;
use crate::domain::{MitigationOutcome, NewPra, Pra, PraRecord, PraStatus, RiskCategory, User};
use crate::error::{DomainError, FieldError};
use crate::notifications::{Notification, NotificationTemplate, Notifier};
use crate::repositories::{DitGroupRepository, PraRepository, UserRepository};

/// The line manager's answers, as collected by the PRA wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PraSubmission {
    pub staff_member_email: String,
    pub scs_email: String,
    pub dit_group_id: i64,
    pub business_unit: String,
    pub authorized_reason: String,
    pub risk_category: RiskCategory,
    pub mitigation_outcome: Option<MitigationOutcome>,
    pub mitigation_measures: String,
}

#[derive(Debug, Clone)]
pub struct PraPolicy {
    pub allow_staff_member_to_be_scs: bool,
    pub validity_months: u32,
    /// Origin used to build links to a PRA in emails.
    pub base_url: String,
}

/// A PRA as shown to one of its parties.
#[derive(Debug, Clone)]
pub struct PraView {
    pub record: PraRecord,
    pub status: PraStatus,
    pub expires_at: DateTime<Utc>,
    pub can_staff_member_decide: bool,
    pub can_scs_decide: bool,
}

pub struct PraService {
    pras: Arc<dyn PraRepository>,
    users: Arc<dyn UserRepository>,
    groups: Arc<dyn DitGroupRepository>,
    notifier: Arc<dyn Notifier>,
    policy: PraPolicy,
}

impl PraService {
    pub fn new(
        pras: Arc<dyn PraRepository>,
        users: Arc<dyn UserRepository>,
        groups: Arc<dyn DitGroupRepository>,
        notifier: Arc<dyn Notifier>,
        policy: PraPolicy,
    ) -> Self {
        Self {
            pras,
            users,
            groups,
            notifier,
            policy,
        }
    }

    pub fn link(&self, pra_id: i64) -> String {
        format!("{}/pra/{}", self.policy.base_url.trim_end_matches('/'), pra_id)
    }

    /// Resolves the staff member and SCS by email. All problems are reported
    /// together.
    async fn resolve_parties(
        &self,
        staff_member_email: &str,
        scs_email: &str,
    ) -> Result<(User, User), DomainError> {
        let mut errors = Vec::new();

        if !staff_member_email.validate_email() {
            errors.push(FieldError::new(
                "staff_member_email",
                "Enter a valid email address",
            ));
        }
        if !scs_email.validate_email() {
            errors.push(FieldError::new("scs_email", "Enter a valid email address"));
        }
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        let staff_member = self.users.find_by_email(staff_member_email).await?;
        let scs = self.users.find_by_email(scs_email).await?;

        if staff_member.is_none() {
            errors.push(FieldError::non_field(format!(
                "Staff member '{}' not found; please make sure they have logged in to the system at least once",
                staff_member_email
            )));
        }
        if scs.is_none() {
            errors.push(FieldError::non_field(format!(
                "SCS '{}' not found; please make sure they have logged in to the system at least once",
                scs_email
            )));
        }

        match (staff_member, scs) {
            (Some(staff_member), Some(scs)) => {
                if staff_member.id == scs.id && !self.policy.allow_staff_member_to_be_scs {
                    return Err(DomainError::validation(
                        "scs_email",
                        "The staff member and the SCS must be different people",
                    ));
                }
                Ok((staff_member, scs))
            }
            _ => Err(DomainError::Validation(errors)),
        }
    }

    /// Checks the first wizard step before its answers are kept.
    pub async fn validate_initial(
        &self,
        staff_member_email: &str,
        scs_email: &str,
        dit_group_id: i64,
    ) -> Result<(), DomainError> {
        if self.groups.find_by_id(dit_group_id).await?.is_none() {
            return Err(DomainError::validation("dit_group", "Select a valid DIT group"));
        }
        self.resolve_parties(staff_member_email, scs_email).await?;
        Ok(())
    }

    pub async fn submit(
        &self,
        line_manager: &User,
        submission: &PraSubmission,
    ) -> Result<Pra, DomainError> {
        info!(
            "PRA submission by line manager {} for {}",
            line_manager.id,
            mask_email(&submission.staff_member_email)
        );

        let group = self
            .groups
            .find_by_id(submission.dit_group_id)
            .await?
            .ok_or_else(|| DomainError::validation("dit_group", "Select a valid DIT group"))?;
        if !group.has_business_unit(&submission.business_unit) {
            return Err(DomainError::validation(
                "business_unit",
                "Select a valid business unit",
            ));
        }

        let (staff_member, scs) = self
            .resolve_parties(&submission.staff_member_email, &submission.scs_email)
            .await
            .inspect_err(|e| warn!("PRA submission rejected: {}", e))?;

        let pra = self
            .pras
            .create(&NewPra {
                staff_member_id: staff_member.id,
                line_manager_id: line_manager.id,
                scs_id: scs.id,
                group: group.name,
                business_unit: submission.business_unit.clone(),
                authorized_reason: submission.authorized_reason.clone(),
                risk_category: submission.risk_category,
                mitigation_outcome: submission.mitigation_outcome,
                mitigation_measures: submission.mitigation_measures.clone(),
            })
            .await?;

        let notification = if pra.needs_staff_member_approval() {
            info!("PRA {} awaiting staff member approval", pra.id);
            Notification::new(
                staff_member.contact_email(),
                NotificationTemplate::PraStaffMemberApprovalRequest,
            )
            .with("link", self.link(pra.id))
            .with("line_manager", line_manager.full_name())
        } else {
            info!("PRA {} finalised without approval", pra.id);
            Notification::new(
                staff_member.contact_email(),
                NotificationTemplate::PraRejectedWithoutApproval,
            )
            .with("line_manager", line_manager.full_name())
        };
        dispatch(self.notifier.as_ref(), notification).await;

        Ok(pra)
    }

    async fn load(&self, id: i64) -> Result<PraRecord, DomainError> {
        self.pras
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("PRA {}", id)))
    }

    /// Only the staff member, line manager or SCS may see a PRA.
    pub async fn view(
        &self,
        user: &User,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<PraView, DomainError> {
        let record = self.load(id).await?;
        if !record.parties.involves(user) {
            warn!("User {} denied access to PRA {}", user.id, id);
            return Err(DomainError::PermissionDenied(
                "Only the people named on a PRA can view it".to_string(),
            ));
        }

        let months = self.policy.validity_months;
        let expired = record.pra.is_expired(now, months);
        Ok(PraView {
            status: record.pra.status(now, months),
            expires_at: record.pra.expires_at(months),
            can_staff_member_decide: !expired
                && record.parties.staff_member.id == user.id
                && record.pra.needs_staff_member_approval(),
            can_scs_decide: !expired
                && record.parties.scs.id == user.id
                && record.pra.needs_scs_approval(),
            record,
        })
    }

    pub async fn record_staff_member_decision(
        &self,
        user: &User,
        id: i64,
        approve: bool,
        now: DateTime<Utc>,
    ) -> Result<Pra, DomainError> {
        let record = self.load(id).await?;
        let parties = &record.parties;

        if parties.staff_member.id != user.id {
            warn!("User {} is not the staff member of PRA {}", user.id, id);
            return Err(DomainError::PermissionDenied(
                "Only the staff member can record this decision".to_string(),
            ));
        }
        self.ensure_open(&record.pra, now)?;
        if !record.pra.needs_staff_member_approval() {
            return Err(DomainError::InvalidTransition(
                "PRA does not need staff member approval".to_string(),
            ));
        }

        let pra = self.pras.record_staff_member_decision(id, approve).await?;
        info!(
            "PRA {} {} by staff member {}",
            id,
            action(approve),
            user.id
        );

        let link = self.link(id);
        dispatch(
            self.notifier.as_ref(),
            Notification::new(
                parties.line_manager.contact_email(),
                NotificationTemplate::PraDecision,
            )
            .with("link", link.clone())
            .with("role", "A staff member")
            .with("who", parties.staff_member.full_name())
            .with("action", action(approve)),
        )
        .await;

        if approve {
            dispatch(
                self.notifier.as_ref(),
                Notification::new(
                    parties.scs.contact_email(),
                    NotificationTemplate::PraScsApprovalRequest,
                )
                .with("link", link)
                .with("staff_member", parties.staff_member.full_name())
                .with("line_manager", parties.line_manager.full_name()),
            )
            .await;
        }

        Ok(pra)
    }

    pub async fn record_scs_decision(
        &self,
        user: &User,
        id: i64,
        approve: bool,
        now: DateTime<Utc>,
    ) -> Result<Pra, DomainError> {
        let record = self.load(id).await?;
        let parties = &record.parties;

        if parties.scs.id != user.id {
            warn!("User {} is not the SCS of PRA {}", user.id, id);
            return Err(DomainError::PermissionDenied(
                "Only the SCS can record this decision".to_string(),
            ));
        }
        self.ensure_open(&record.pra, now)?;
        if !record.pra.needs_scs_approval() {
            return Err(DomainError::InvalidTransition(
                "PRA does not need SCS approval".to_string(),
            ));
        }

        let pra = self.pras.record_scs_decision(id, approve).await?;
        info!("PRA {} {} by SCS {}", id, action(approve), user.id);

        dispatch(
            self.notifier.as_ref(),
            Notification::new(
                parties.line_manager.contact_email(),
                NotificationTemplate::PraDecision,
            )
            .with("link", self.link(id))
            .with("role", "SCS")
            .with("who", parties.scs.full_name())
            .with("action", action(approve)),
        )
        .await;

        Ok(pra)
    }

    fn ensure_open(&self, pra: &Pra, now: DateTime<Utc>) -> Result<(), DomainError> {
        if pra.is_expired(now, self.policy.validity_months) {
            warn!("Decision refused on expired PRA {}", pra.id);
            return Err(DomainError::InvalidTransition("PRA has expired".to_string()));
        }
        Ok(())
    }
}

fn action(approve: bool) -> &'static str {
    if approve {
        "approved"
    } else {
        "rejected"
    }
}
