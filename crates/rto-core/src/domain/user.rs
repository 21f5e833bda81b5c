//! User domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Login identity issued by the SSO broker.
    pub email: String,
    /// Preferred address for notifications; may be empty.
    pub contact_email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn contact_email(&self) -> &str {
        if self.contact_email.is_empty() {
            &self.email
        } else {
            &self.contact_email
        }
    }

    /// Lookups "by email" accept either the login or the contact address.
    pub fn matches_email(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email)
            || (!self.contact_email.is_empty() && self.contact_email.eq_ignore_ascii_case(email))
    }
}

/// Identity claims taken from a verified SSO token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SsoProfile {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub contact_email: String,
}
