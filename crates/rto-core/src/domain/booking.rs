//! Booking domain entity

use chrono::{DateTime, NaiveDate, Utc};
use rto_shared::constants::ON_BEHALF_OF_YOURSELF;
use rto_shared::utils::non_empty;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::user::User;
use crate::error::FieldError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    /// False once cancelled.
    pub is_active: bool,
    pub user_id: i64,
    pub on_behalf_of_name: Option<String>,
    pub on_behalf_of_dit_email: Option<String>,
    pub booking_date: NaiveDate,
    pub building_id: i64,
    pub floor_id: i64,
    /// Only set on bookings made before DIT groups existed.
    pub directorate: Option<String>,
    pub group: Option<String>,
    pub business_unit: Option<String>,
    pub booked_timestamp: DateTime<Utc>,
    pub canceled_timestamp: Option<DateTime<Utc>>,
}

impl Booking {
    /// Who the desk is for: "Yourself", a name, an email, or "Name (email)".
    pub fn on_behalf_of(&self) -> String {
        OnBehalfOf {
            name: self.on_behalf_of_name.clone(),
            dit_email: self.on_behalf_of_dit_email.clone(),
        }
        .display()
    }
}

/// The person a booking is made for when it is not the booking user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct OnBehalfOf {
    #[validate(length(max = 80, message = "Name must be 80 characters or fewer"))]
    pub name: Option<String>,
    #[validate(
        email(message = "Enter a valid email address"),
        length(max = 80, message = "Email address must be 80 characters or fewer")
    )]
    pub dit_email: Option<String>,
}

impl OnBehalfOf {
    pub fn new(name: Option<&str>, dit_email: Option<&str>) -> Self {
        Self {
            name: non_empty(name).map(str::to_string),
            dit_email: non_empty(dit_email).map(str::to_string),
        }
    }

    pub fn is_yourself(&self) -> bool {
        non_empty(self.name.as_deref()).is_none() && non_empty(self.dit_email.as_deref()).is_none()
    }

    /// Length and email format problems, keyed by the form field names.
    pub fn field_errors(&self) -> Vec<FieldError> {
        let Err(errors) = self.validate() else {
            return Vec::new();
        };

        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));
        fields
            .into_iter()
            .flat_map(|(field, errs)| {
                let field = format!("on_behalf_of_{}", field);
                errs.iter()
                    .map(move |e| {
                        let message = e
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string());
                        FieldError::new(&field, message)
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub fn display(&self) -> String {
        match (
            non_empty(self.name.as_deref()),
            non_empty(self.dit_email.as_deref()),
        ) {
            (Some(name), Some(email)) => format!("{} ({})", name, email),
            (Some(name), None) => name.to_string(),
            (None, Some(email)) => email.to_string(),
            (None, None) => ON_BEHALF_OF_YOURSELF.to_string(),
        }
    }
}

/// Insert payload for a new active booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBooking {
    pub user_id: i64,
    pub on_behalf_of: OnBehalfOf,
    pub booking_date: NaiveDate,
    pub building_id: i64,
    pub floor_id: i64,
    pub group: String,
    pub business_unit: String,
}

/// A booking together with the names of its building and floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingDetails {
    pub booking: Booking,
    pub building_name: String,
    pub floor_name: String,
}

/// A booking joined with everything the activity stream publishes about it.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRecord {
    pub details: BookingDetails,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(name: Option<&str>, email: Option<&str>) -> Booking {
        Booking {
            id: 1,
            is_active: true,
            user_id: 1,
            on_behalf_of_name: name.map(str::to_string),
            on_behalf_of_dit_email: email.map(str::to_string),
            booking_date: NaiveDate::from_ymd_opt(2020, 9, 1).unwrap(),
            building_id: 1,
            floor_id: 1,
            directorate: None,
            group: Some("Trade".to_string()),
            business_unit: Some("Exports".to_string()),
            booked_timestamp: Utc::now(),
            canceled_timestamp: None,
        }
    }

    #[test]
    fn test_on_behalf_of_display_rules() {
        assert_eq!(booking(None, None).on_behalf_of(), "Yourself");
        assert_eq!(booking(Some("Donald Duck"), None).on_behalf_of(), "Donald Duck");
        assert_eq!(
            booking(None, Some("donald.duck@digital.trade.gov.uk")).on_behalf_of(),
            "donald.duck@digital.trade.gov.uk"
        );
        assert_eq!(
            booking(Some("Donald Duck"), Some("donald.duck@digital.trade.gov.uk")).on_behalf_of(),
            "Donald Duck (donald.duck@digital.trade.gov.uk)"
        );
    }

    #[test]
    fn test_empty_strings_count_as_absent() {
        assert_eq!(booking(Some(""), Some("")).on_behalf_of(), "Yourself");
        assert_eq!(booking(Some(""), Some("a@b.gov.uk")).on_behalf_of(), "a@b.gov.uk");
        assert_eq!(booking(Some("Jo"), Some("")).on_behalf_of(), "Jo");
    }

    #[test]
    fn test_on_behalf_of_new_drops_blank_values() {
        let someone = OnBehalfOf::new(Some("  "), Some(" a@b.gov.uk "));
        assert_eq!(someone.name, None);
        assert_eq!(someone.dit_email.as_deref(), Some("a@b.gov.uk"));
        assert!(!someone.is_yourself());
        assert!(OnBehalfOf::new(None, Some("")).is_yourself());
    }

    #[test]
    fn test_on_behalf_of_over_column_length_is_a_field_error() {
        let long = "x".repeat(81);
        let errors = OnBehalfOf::new(Some(&long), None).field_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field.as_deref(), Some("on_behalf_of_name"));

        let email = format!("{}@digital.trade.gov.uk", "d".repeat(70));
        let errors = OnBehalfOf::new(None, Some(&email)).field_errors();
        assert!(errors
            .iter()
            .all(|e| e.field.as_deref() == Some("on_behalf_of_dit_email")));
        assert!(!errors.is_empty());

        assert!(OnBehalfOf::new(Some(&"x".repeat(80)), Some("a@b.gov.uk"))
            .field_errors()
            .is_empty());
    }

    #[test]
    fn test_on_behalf_of_rejects_malformed_email() {
        let errors = OnBehalfOf::new(None, Some("not-an-email")).field_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Enter a valid email address");
    }
}
