use chrono::{DateTime, NaiveDate, Utc};
use rto_core::domain::{Booking, BookingDetails, Building, DitGroup, FloorAvailability, User};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct WhoForForm {
    #[serde(default)]
    pub for_myself: bool,
    pub on_behalf_of_name: Option<String>,
    pub on_behalf_of_dit_email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DetailsForm {
    /// `YYYY-MM-DD`
    pub booking_date: String,
    pub building: i64,
    pub dit_group: i64,
}

#[derive(Debug, Deserialize)]
pub struct BusinessUnitForm {
    pub business_unit: String,
}

#[derive(Debug, Deserialize)]
pub struct FinalizeForm {
    pub floor: i64,
}

#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.full_name(),
            email: user.contact_email().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookingView {
    pub id: i64,
    pub is_active: bool,
    pub on_behalf_of: String,
    pub booking_date: NaiveDate,
    pub building: String,
    pub floor: String,
    pub directorate: Option<String>,
    pub group: Option<String>,
    pub business_unit: Option<String>,
    pub booked_timestamp: DateTime<Utc>,
    pub canceled_timestamp: Option<DateTime<Utc>>,
}

impl From<&BookingDetails> for BookingView {
    fn from(details: &BookingDetails) -> Self {
        let booking = &details.booking;
        Self {
            id: booking.id,
            is_active: booking.is_active,
            on_behalf_of: booking.on_behalf_of(),
            booking_date: booking.booking_date,
            building: details.building_name.clone(),
            floor: details.floor_name.clone(),
            directorate: booking.directorate.clone(),
            group: booking.group.clone(),
            business_unit: booking.business_unit.clone(),
            booked_timestamp: booking.booked_timestamp,
            canceled_timestamp: booking.canceled_timestamp,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MyBookings {
    pub user: UserView,
    pub bookings: Vec<BookingView>,
}

#[derive(Debug, Serialize)]
pub struct CancelledBooking {
    pub next: String,
    pub id: i64,
    pub canceled_timestamp: Option<DateTime<Utc>>,
}

impl CancelledBooking {
    pub fn new(next: &str, booking: &Booking) -> Self {
        Self {
            next: next.to_string(),
            id: booking.id,
            canceled_timestamp: booking.canceled_timestamp,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DitGroupView {
    pub id: i64,
    pub name: String,
    pub business_units: Vec<String>,
}

impl From<&DitGroup> for DitGroupView {
    fn from(group: &DitGroup) -> Self {
        Self {
            id: group.id,
            name: group.name.clone(),
            business_units: group.business_units(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WhoForStep {
    pub for_myself: Option<bool>,
    pub on_behalf_of_name: Option<String>,
    pub on_behalf_of_dit_email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DetailsStep {
    pub buildings: Vec<Building>,
    pub dit_groups: Vec<DitGroupView>,
    pub booking_date: Option<NaiveDate>,
    pub building: Option<i64>,
    pub dit_group: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct BusinessUnitStep {
    pub dit_group: String,
    pub business_units: Vec<String>,
    pub business_unit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FloorChoice {
    pub id: i64,
    pub name: String,
    pub nr_of_desks: i32,
    pub available: i64,
    pub is_full: bool,
}

impl From<&FloorAvailability> for FloorChoice {
    fn from(availability: &FloorAvailability) -> Self {
        Self {
            id: availability.floor.id,
            name: availability.floor.name.clone(),
            nr_of_desks: availability.floor.nr_of_desks,
            available: availability.available(),
            is_full: availability.is_full(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FinalizeStep {
    pub on_behalf_of: String,
    pub booking_date: NaiveDate,
    pub building: i64,
    pub business_unit: String,
    pub floors: Vec<FloorChoice>,
}

#[derive(Debug, Serialize)]
pub struct BookingCreated {
    pub next: String,
    pub booking: BookingView,
}
