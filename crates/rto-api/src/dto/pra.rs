use chrono::{DateTime, Utc};
use rto_core::services::PraView;
use serde::{Deserialize, Serialize};

use super::booking::{DitGroupView, UserView};
use super::Choice;

#[derive(Debug, Deserialize)]
pub struct InitialForm {
    pub staff_member_email: String,
    pub scs_email: String,
    pub dit_group: i64,
}

#[derive(Debug, Deserialize)]
pub struct BusinessUnitForm {
    pub business_unit: String,
}

#[derive(Debug, Deserialize)]
pub struct ReasonForm {
    pub authorized_reason: String,
}

#[derive(Debug, Deserialize)]
pub struct RiskCategoryForm {
    pub risk_category: String,
}

#[derive(Debug, Deserialize)]
pub struct MitigationForm {
    pub mitigation_outcome: String,
}

#[derive(Debug, Deserialize)]
pub struct MeasuresForm {
    #[serde(default)]
    pub mitigation_measures: String,
}

#[derive(Debug, Serialize)]
pub struct InitialStep {
    pub dit_groups: Vec<DitGroupView>,
    pub staff_member_email: Option<String>,
    pub scs_email: Option<String>,
    pub dit_group: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ChoiceStep {
    pub choices: Vec<Choice>,
    pub selected: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MeasuresStep {
    pub mitigation_outcome: String,
    pub mitigation_measures: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PreferNotToSayStep {
    pub risk_category: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct Thanks {
    pub pra_id: Option<i64>,
    pub link: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PraDetail {
    pub id: i64,
    pub status: String,
    /// No further decision can change the outcome.
    pub is_final: bool,
    pub staff_member: UserView,
    pub line_manager: UserView,
    pub scs: UserView,
    pub group: String,
    pub business_unit: String,
    pub authorized_reason: String,
    pub risk_category: String,
    pub risk_category_description: String,
    pub mitigation_outcome: Option<String>,
    pub mitigation_measures: String,
    pub created_timestamp: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub approved_staff_member: Option<bool>,
    pub approved_scs: Option<bool>,
    pub can_staff_member_decide: bool,
    pub can_scs_decide: bool,
}

impl From<&PraView> for PraDetail {
    fn from(view: &PraView) -> Self {
        let pra = &view.record.pra;
        let parties = &view.record.parties;
        Self {
            id: pra.id,
            status: view.status.as_str().to_string(),
            is_final: view.status.is_terminal(),
            staff_member: UserView::from(&parties.staff_member),
            line_manager: UserView::from(&parties.line_manager),
            scs: UserView::from(&parties.scs),
            group: pra.group.clone(),
            business_unit: pra.business_unit.clone(),
            authorized_reason: pra.authorized_reason.clone(),
            risk_category: pra.risk_category.as_str().to_string(),
            risk_category_description: pra.risk_category.description().to_string(),
            mitigation_outcome: pra.mitigation_outcome.map(|o| o.as_str().to_string()),
            mitigation_measures: pra.mitigation_measures.clone(),
            created_timestamp: pra.created_timestamp,
            expires_at: view.expires_at,
            approved_staff_member: pra.approved_staff_member,
            approved_scs: pra.approved_scs,
            can_staff_member_decide: view.can_staff_member_decide,
            can_scs_decide: view.can_scs_decide,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Decision {
    pub id: i64,
    pub status: String,
}
