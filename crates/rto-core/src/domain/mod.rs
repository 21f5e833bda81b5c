//! # RTO Core - Domain Module
//!
//! Domain entities for desk booking and personal risk assessments.

pub mod booking;
pub mod building;
pub mod dit_group;
pub mod pra;
pub mod user;

// Re-export all entities and enums
pub use booking::{Booking, BookingDetails, BookingRecord, NewBooking, OnBehalfOf};
pub use building::{Building, Floor, FloorAvailability};
pub use dit_group::DitGroup;
pub use pra::{
    AuthorizedReason, MitigationOutcome, NewPra, Pra, PraParties, PraRecord, PraStatus,
    RiskCategory,
};
pub use user::{SsoProfile, User};
