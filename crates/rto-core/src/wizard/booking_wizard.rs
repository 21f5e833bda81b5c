//! Booking wizard: who-for, details, business unit, finalize.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::WizardState;
use crate::domain::OnBehalfOf;
use crate::error::{DomainError, FieldError};
use crate::services::booking_service::BookingRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStep {
    WhoFor,
    Details,
    BusinessUnit,
    Finalize,
    Done,
}

impl BookingStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStep::WhoFor => "who-for",
            BookingStep::Details => "details",
            BookingStep::BusinessUnit => "business-unit",
            BookingStep::Finalize => "finalize",
            BookingStep::Done => "done",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            BookingStep::WhoFor => "/booking/create/who-for",
            BookingStep::Details => "/booking/create/details",
            BookingStep::BusinessUnit => "/booking/create/business-unit",
            BookingStep::Finalize => "/booking/create/finalize",
            BookingStep::Done => "/bookings",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingWizard {
    pub who_for: Option<OnBehalfOf>,
    pub booking_date: Option<NaiveDate>,
    pub building_id: Option<i64>,
    pub dit_group_id: Option<i64>,
    pub business_unit: Option<String>,
}

impl WizardState for BookingWizard {
    const SESSION_KEY: &'static str = "booking_wizard";
}

impl BookingWizard {
    /// Fails with `MissingWizardStep` naming the first earlier step that has
    /// not been completed.
    pub fn ensure_reached(&self, step: BookingStep) -> Result<(), DomainError> {
        let missing = |s: BookingStep| DomainError::MissingWizardStep(s.as_str().to_string());

        if step == BookingStep::WhoFor {
            return Ok(());
        }
        if self.who_for.is_none() {
            return Err(missing(BookingStep::WhoFor));
        }
        if step == BookingStep::Details {
            return Ok(());
        }
        if self.booking_date.is_none() || self.building_id.is_none() || self.dit_group_id.is_none()
        {
            return Err(missing(BookingStep::Details));
        }
        if step == BookingStep::BusinessUnit {
            return Ok(());
        }
        if self.business_unit.is_none() {
            return Err(missing(BookingStep::BusinessUnit));
        }
        Ok(())
    }

    pub fn record_who_for(
        &mut self,
        for_myself: bool,
        name: Option<&str>,
        dit_email: Option<&str>,
    ) -> Result<BookingStep, DomainError> {
        let who_for = if for_myself {
            OnBehalfOf::default()
        } else {
            let someone = OnBehalfOf::new(name, dit_email);
            let mut errors = someone.field_errors();
            if someone.is_yourself() {
                errors.push(FieldError::non_field(
                    "Enter the name or the DIT email address of the person you are booking for",
                ));
            }
            if !errors.is_empty() {
                return Err(DomainError::Validation(errors));
            }
            someone
        };

        self.who_for = Some(who_for);
        Ok(BookingStep::Details)
    }

    pub fn record_details(
        &mut self,
        booking_date: NaiveDate,
        building_id: i64,
        dit_group_id: i64,
    ) -> Result<BookingStep, DomainError> {
        self.ensure_reached(BookingStep::Details)?;

        if self.dit_group_id != Some(dit_group_id) {
            self.business_unit = None;
        }
        self.booking_date = Some(booking_date);
        self.building_id = Some(building_id);
        self.dit_group_id = Some(dit_group_id);
        Ok(BookingStep::BusinessUnit)
    }

    pub fn record_business_unit(&mut self, business_unit: &str) -> Result<BookingStep, DomainError> {
        self.ensure_reached(BookingStep::BusinessUnit)?;
        self.business_unit = Some(business_unit.to_string());
        Ok(BookingStep::Finalize)
    }

    /// Everything collected so far plus the chosen floor.
    pub fn booking_request(&self, floor_id: i64) -> Result<BookingRequest, DomainError> {
        self.ensure_reached(BookingStep::Finalize)?;

        match (
            &self.who_for,
            self.booking_date,
            self.building_id,
            self.dit_group_id,
            &self.business_unit,
        ) {
            (Some(who_for), Some(booking_date), Some(building_id), Some(dit_group_id), Some(bu)) => {
                Ok(BookingRequest {
                    on_behalf_of: who_for.clone(),
                    booking_date,
                    building_id,
                    floor_id,
                    dit_group_id,
                    business_unit: bu.clone(),
                })
            }
            _ => Err(DomainError::MissingWizardStep(
                BookingStep::WhoFor.as_str().to_string(),
            )),
        }
    }
}
