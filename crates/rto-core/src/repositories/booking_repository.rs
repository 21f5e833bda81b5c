//! Booking repository trait (port)

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use super::FeedCursor;
use crate::domain::{Booking, BookingDetails, BookingRecord, NewBooking};
use crate::error::DomainError;

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Inserts an active booking if the floor still has a free desk on that
    /// date, atomically with respect to concurrent reservations. Returns
    /// `DomainError::FloorFullyBooked` otherwise.
    async fn reserve(&self, booking: &NewBooking) -> Result<Booking, DomainError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Booking>, DomainError>;

    /// Marks an active booking cancelled. Returns `InvalidTransition` when it
    /// is already cancelled.
    async fn cancel(&self, id: i64, at: DateTime<Utc>) -> Result<Booking, DomainError>;

    /// Active bookings of a user from `from` onwards, ordered by date.
    async fn list_upcoming_for_user(
        &self,
        user_id: i64,
        from: NaiveDate,
    ) -> Result<Vec<BookingDetails>, DomainError>;

    /// Bookings ordered by (booked_timestamp, id), strictly after `after`.
    async fn feed_page(
        &self,
        after: Option<FeedCursor>,
        limit: u32,
    ) -> Result<Vec<BookingRecord>, DomainError>;
}
