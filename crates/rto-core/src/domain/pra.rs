// ============================================================================
// RTO Core - Personal Risk Assessment Entity
// File: crates/rto-core/src/domain/pra.rs
// Description: PRA entity and its approval state machine
// ============================================================================

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

use super::user::User;

/// Risk category chosen by the line manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    HighRisk,
    LivesWithHighRisk,
    ModerateRisk,
    LivesWithModerateRisk,
    ElevatedRisk,
    NoCategory,
    PreferNotToSay,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; 7] = [
        RiskCategory::HighRisk,
        RiskCategory::LivesWithHighRisk,
        RiskCategory::ModerateRisk,
        RiskCategory::LivesWithModerateRisk,
        RiskCategory::ElevatedRisk,
        RiskCategory::NoCategory,
        RiskCategory::PreferNotToSay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::HighRisk => "high_risk",
            RiskCategory::LivesWithHighRisk => "lives_with_high_risk",
            RiskCategory::ModerateRisk => "moderate_risk",
            RiskCategory::LivesWithModerateRisk => "lives_with_moderate_risk",
            RiskCategory::ElevatedRisk => "elevated_risk",
            RiskCategory::NoCategory => "no_category",
            RiskCategory::PreferNotToSay => "prefer_not_to_say",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }

    pub fn description(&self) -> &'static str {
        match self {
            RiskCategory::HighRisk => {
                "High risk (clinically extremely vulnerable) due to existing health conditions"
            }
            RiskCategory::LivesWithHighRisk => {
                "Lives with someone at high risk (clinically extremely vulnerable) due to existing health conditions"
            }
            RiskCategory::ModerateRisk => "Moderate risk (clinically vulnerable)",
            RiskCategory::LivesWithModerateRisk => {
                "Lives with someone at moderate risk (clinically vulnerable)"
            }
            RiskCategory::ElevatedRisk => {
                "Falls into one of the categories where evidence suggests that risk may be elevated"
            }
            RiskCategory::NoCategory => "Does not fall into any of the above categories",
            RiskCategory::PreferNotToSay => "The staff member would prefer not to say",
        }
    }

    /// Categories whose assessment continues with a mitigation outcome.
    pub fn requires_mitigation(&self) -> bool {
        matches!(
            self,
            RiskCategory::ModerateRisk
                | RiskCategory::LivesWithModerateRisk
                | RiskCategory::ElevatedRisk
        )
    }
}

/// Line manager's conclusion after exploring mitigation measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MitigationOutcome {
    ApproveNoMitigation,
    ApproveMitigationRequired,
    DoNotApprove,
}

impl MitigationOutcome {
    pub const ALL: [MitigationOutcome; 3] = [
        MitigationOutcome::ApproveNoMitigation,
        MitigationOutcome::ApproveMitigationRequired,
        MitigationOutcome::DoNotApprove,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MitigationOutcome::ApproveNoMitigation => "approve_no_mitigation",
            MitigationOutcome::ApproveMitigationRequired => "approve_mitigation_required",
            MitigationOutcome::DoNotApprove => "do_not_approve",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.as_str() == s)
    }

    pub fn description(&self) -> &'static str {
        match self {
            MitigationOutcome::ApproveNoMitigation => "I approve - no mitigation measures required",
            MitigationOutcome::ApproveMitigationRequired => {
                "I approve - mitigation measures required"
            }
            MitigationOutcome::DoNotApprove => {
                "I do not approve - mitigation measures explored but considered insufficient"
            }
        }
    }

    /// Outcomes that need the measures written down.
    pub fn requires_measures(&self) -> bool {
        !matches!(self, MitigationOutcome::ApproveNoMitigation)
    }
}

/// Authorised reasons for office attendance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizedReason {
    InformationAccess,
    CorporateEnabler,
    PersonalCircumstances,
    MinistersSupport,
    TradeNegotiations,
    Visitor,
    FacilitiesManagement,
    CollectPersonalItems,
    Other,
}

impl AuthorizedReason {
    pub const ALL: [AuthorizedReason; 9] = [
        AuthorizedReason::InformationAccess,
        AuthorizedReason::CorporateEnabler,
        AuthorizedReason::PersonalCircumstances,
        AuthorizedReason::MinistersSupport,
        AuthorizedReason::TradeNegotiations,
        AuthorizedReason::Visitor,
        AuthorizedReason::FacilitiesManagement,
        AuthorizedReason::CollectPersonalItems,
        AuthorizedReason::Other,
    ];

    /// Stored and displayed verbatim.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorizedReason::InformationAccess => "Information access requirements",
            AuthorizedReason::CorporateEnabler => "Essential corporate enabler support",
            AuthorizedReason::PersonalCircumstances => "Personal circumstances",
            AuthorizedReason::MinistersSupport => "Support to Ministers or Cabinet Office",
            AuthorizedReason::TradeNegotiations => "Trade negotiations",
            AuthorizedReason::Visitor => "Visitor",
            AuthorizedReason::FacilitiesManagement => "Facilities Management",
            AuthorizedReason::CollectPersonalItems => "Collect Personal Items",
            AuthorizedReason::Other => "Other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == s)
    }
}

/// Where a PRA stands, computed on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PraStatus {
    /// Finalised without asking anyone (prefer not to say, or not approved).
    RejectedWithoutApproval,
    AwaitingStaffMember,
    RejectedByStaffMember,
    AwaitingScs,
    RejectedByScs,
    Approved,
    Expired,
}

impl PraStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PraStatus::RejectedWithoutApproval => "rejected_without_approval",
            PraStatus::AwaitingStaffMember => "awaiting_staff_member",
            PraStatus::RejectedByStaffMember => "rejected_by_staff_member",
            PraStatus::AwaitingScs => "awaiting_scs",
            PraStatus::RejectedByScs => "rejected_by_scs",
            PraStatus::Approved => "approved",
            PraStatus::Expired => "expired",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PraStatus::AwaitingStaffMember | PraStatus::AwaitingScs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pra {
    pub id: i64,
    pub staff_member_id: i64,
    pub line_manager_id: i64,
    pub scs_id: i64,
    pub group: String,
    pub business_unit: String,
    pub authorized_reason: String,
    pub risk_category: RiskCategory,
    pub mitigation_outcome: Option<MitigationOutcome>,
    /// Empty when no measures were recorded.
    pub mitigation_measures: String,
    pub created_timestamp: DateTime<Utc>,
    pub approved_staff_member: Option<bool>,
    pub approved_scs: Option<bool>,
    /// Imported from the paper process.
    pub migrated: bool,
}

impl Pra {
    /// False when the line manager's assessment already rules out attendance.
    pub fn requires_approval(&self) -> bool {
        self.risk_category != RiskCategory::PreferNotToSay
            && self.mitigation_outcome != Some(MitigationOutcome::DoNotApprove)
    }

    pub fn needs_staff_member_approval(&self) -> bool {
        self.requires_approval() && self.approved_staff_member.is_none()
    }

    /// SCS is only asked after the staff member has agreed.
    pub fn needs_scs_approval(&self) -> bool {
        self.requires_approval()
            && self.approved_staff_member == Some(true)
            && self.approved_scs.is_none()
    }

    pub fn is_approved(&self) -> bool {
        self.requires_approval()
            && self.approved_staff_member == Some(true)
            && self.approved_scs == Some(true)
    }

    pub fn expires_at(&self, validity_months: u32) -> DateTime<Utc> {
        self.created_timestamp
            .checked_add_months(Months::new(validity_months))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_expired(&self, now: DateTime<Utc>, validity_months: u32) -> bool {
        self.expires_at(validity_months) < now
    }

    pub fn status(&self, now: DateTime<Utc>, validity_months: u32) -> PraStatus {
        if self.is_expired(now, validity_months) {
            PraStatus::Expired
        } else if !self.requires_approval() {
            PraStatus::RejectedWithoutApproval
        } else {
            match (self.approved_staff_member, self.approved_scs) {
                (None, _) => PraStatus::AwaitingStaffMember,
                (Some(false), _) => PraStatus::RejectedByStaffMember,
                (Some(true), None) => PraStatus::AwaitingScs,
                (Some(true), Some(false)) => PraStatus::RejectedByScs,
                (Some(true), Some(true)) => PraStatus::Approved,
            }
        }
    }
}

/// Insert payload for a new PRA. The line manager is the submitting user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPra {
    pub staff_member_id: i64,
    pub line_manager_id: i64,
    pub scs_id: i64,
    pub group: String,
    pub business_unit: String,
    pub authorized_reason: String,
    pub risk_category: RiskCategory,
    pub mitigation_outcome: Option<MitigationOutcome>,
    pub mitigation_measures: String,
}

/// The three people a PRA involves.
#[derive(Debug, Clone, PartialEq)]
pub struct PraParties {
    pub staff_member: User,
    pub line_manager: User,
    pub scs: User,
}

impl PraParties {
    pub fn involves(&self, user: &User) -> bool {
        [&self.staff_member, &self.line_manager, &self.scs]
            .iter()
            .any(|party| party.id == user.id)
    }
}

/// A PRA joined with its parties.
#[derive(Debug, Clone, PartialEq)]
pub struct PraRecord {
    pub pra: Pra,
    pub parties: PraParties,
}
