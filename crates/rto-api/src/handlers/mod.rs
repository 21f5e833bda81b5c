//! HTTP handlers

pub mod activity_stream;
pub mod booking_wizard;
pub mod bookings;
pub mod health;
pub mod pra;
pub mod pra_wizard;
