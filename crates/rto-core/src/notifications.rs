//! Notification port
//!
//! Emails are sent through a templating provider; the domain only picks the
//! template and fills in its personalisation fields.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTemplate {
    BookingConfirmation,
    BookingCancellation,
    /// Personalisation: `link`, `line_manager`.
    PraStaffMemberApprovalRequest,
    /// Personalisation: `line_manager`.
    PraRejectedWithoutApproval,
    /// Personalisation: `link`, `role`, `who`, `action`.
    PraDecision,
    /// Personalisation: `link`, `staff_member`, `line_manager`.
    PraScsApprovalRequest,
}

impl NotificationTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationTemplate::BookingConfirmation => "booking_confirmation",
            NotificationTemplate::BookingCancellation => "booking_cancellation",
            NotificationTemplate::PraStaffMemberApprovalRequest => {
                "pra_staff_member_approval_request"
            }
            NotificationTemplate::PraRejectedWithoutApproval => "pra_rejected_without_approval",
            NotificationTemplate::PraDecision => "pra_decision",
            NotificationTemplate::PraScsApprovalRequest => "pra_scs_approval_request",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub email_address: String,
    pub template: NotificationTemplate,
    pub personalisation: BTreeMap<String, String>,
}

impl Notification {
    pub fn new(email_address: &str, template: NotificationTemplate) -> Self {
        Self {
            email_address: email_address.to_string(),
            template,
            personalisation: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.personalisation.insert(key.to_string(), value.into());
        self
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), DomainError>;
}
