// ============================================================================
// RTO Infrastructure - PostgreSQL Booking Repository
// File: crates/rto-infrastructure/src/database/postgres/booking_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{debug, info};

use rto_core::domain::{Booking, BookingDetails, BookingRecord, NewBooking};
use rto_core::error::DomainError;
use rto_core::repositories::{BookingRepository, FeedCursor};

use super::user_repo_impl::{fetch_users, take_user};
use crate::database::db_error;

const BOOKING_COLUMNS: &str = "b.id, b.is_active, b.user_id, b.on_behalf_of_name, \
     b.on_behalf_of_dit_email, b.booking_date, b.building_id, b.floor_id, b.directorate, \
     b.group_name, b.business_unit, b.booked_timestamp, b.canceled_timestamp";

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal row type for SQLx mapping
#[derive(Debug, FromRow)]
struct BookingRow {
    id: i64,
    is_active: bool,
    user_id: i64,
    on_behalf_of_name: Option<String>,
    on_behalf_of_dit_email: Option<String>,
    booking_date: NaiveDate,
    building_id: i64,
    floor_id: i64,
    directorate: Option<String>,
    group_name: Option<String>,
    business_unit: Option<String>,
    booked_timestamp: DateTime<Utc>,
    canceled_timestamp: Option<DateTime<Utc>>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            id: row.id,
            is_active: row.is_active,
            user_id: row.user_id,
            on_behalf_of_name: row.on_behalf_of_name,
            on_behalf_of_dit_email: row.on_behalf_of_dit_email,
            booking_date: row.booking_date,
            building_id: row.building_id,
            floor_id: row.floor_id,
            directorate: row.directorate,
            group: row.group_name,
            business_unit: row.business_unit,
            booked_timestamp: row.booked_timestamp,
            canceled_timestamp: row.canceled_timestamp,
        }
    }
}

#[derive(Debug, FromRow)]
struct BookingDetailsRow {
    #[sqlx(flatten)]
    booking: BookingRow,
    building_name: String,
    floor_name: String,
}

impl From<BookingDetailsRow> for BookingDetails {
    fn from(row: BookingDetailsRow) -> Self {
        BookingDetails {
            booking: row.booking.into(),
            building_name: row.building_name,
            floor_name: row.floor_name,
        }
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn reserve(&self, booking: &NewBooking) -> Result<Booking, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("starting reservation"))?;

        // Serialises reservations for this floor until commit.
        let capacity: Option<(i32,)> = sqlx::query_as(
            "SELECT nr_of_desks FROM floors WHERE id = $1 AND building_id = $2 FOR UPDATE",
        )
        .bind(booking.floor_id)
        .bind(booking.building_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("locking floor"))?;

        let (capacity,) =
            capacity.ok_or_else(|| DomainError::NotFound(format!("Floor {}", booking.floor_id)))?;

        let (booked,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM bookings
            WHERE floor_id = $1 AND booking_date = $2 AND is_active
            "#,
        )
        .bind(booking.floor_id)
        .bind(booking.booking_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("counting bookings"))?;

        if booked >= i64::from(capacity) {
            debug!(
                "Floor {} has {}/{} desks booked on {}",
                booking.floor_id, booked, capacity, booking.booking_date
            );
            tx.rollback().await.map_err(db_error("rolling back"))?;
            return Err(DomainError::FloorFullyBooked);
        }

        let row: BookingRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO bookings AS b (
                user_id, on_behalf_of_name, on_behalf_of_dit_email, booking_date,
                building_id, floor_id, group_name, business_unit
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(booking.user_id)
        .bind(&booking.on_behalf_of.name)
        .bind(&booking.on_behalf_of.dit_email)
        .bind(booking.booking_date)
        .bind(booking.building_id)
        .bind(booking.floor_id)
        .bind(&booking.group)
        .bind(&booking.business_unit)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("inserting booking"))?;

        tx.commit().await.map_err(db_error("committing booking"))?;

        info!(
            "Reserved desk {}/{} on floor {} for {}",
            booked + 1,
            capacity,
            booking.floor_id,
            booking.booking_date
        );
        Ok(row.into())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Booking>, DomainError> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings b WHERE b.id = $1",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding booking"))?;

        Ok(row.map(Booking::from))
    }

    async fn cancel(&self, id: i64, at: DateTime<Utc>) -> Result<Booking, DomainError> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            r#"
            UPDATE bookings AS b
            SET is_active = FALSE, canceled_timestamp = $2
            WHERE b.id = $1 AND b.is_active
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("cancelling booking"))?;

        match row {
            Some(row) => Ok(row.into()),
            None => match self.find_by_id(id).await? {
                Some(_) => Err(DomainError::InvalidTransition(
                    "Booking is already cancelled".to_string(),
                )),
                None => Err(DomainError::NotFound(format!("Booking {}", id))),
            },
        }
    }

    async fn list_upcoming_for_user(
        &self,
        user_id: i64,
        from: NaiveDate,
    ) -> Result<Vec<BookingDetails>, DomainError> {
        let rows: Vec<BookingDetailsRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}, bu.name AS building_name, f.name AS floor_name
            FROM bookings b
            JOIN buildings bu ON bu.id = b.building_id
            JOIN floors f ON f.id = b.floor_id
            WHERE b.user_id = $1 AND b.is_active AND b.booking_date >= $2
            ORDER BY b.booking_date, b.id
            "#,
            BOOKING_COLUMNS
        ))
        .bind(user_id)
        .bind(from)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing upcoming bookings"))?;

        Ok(rows.into_iter().map(BookingDetails::from).collect())
    }

    async fn feed_page(
        &self,
        after: Option<FeedCursor>,
        limit: u32,
    ) -> Result<Vec<BookingRecord>, DomainError> {
        let rows: Vec<BookingDetailsRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}, bu.name AS building_name, f.name AS floor_name
            FROM bookings b
            JOIN buildings bu ON bu.id = b.building_id
            JOIN floors f ON f.id = b.floor_id
            WHERE $1::timestamptz IS NULL OR (b.booked_timestamp, b.id) > ($1, $2)
            ORDER BY b.booked_timestamp, b.id
            LIMIT $3
            "#,
            BOOKING_COLUMNS
        ))
        .bind(after.map(|c| c.timestamp))
        .bind(after.map(|c| c.id).unwrap_or_default())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("reading booking feed"))?;

        let user_ids: Vec<i64> = rows.iter().map(|r| r.booking.user_id).collect();
        let users = fetch_users(&self.pool, &user_ids).await?;

        rows.into_iter()
            .map(|row| {
                let user = take_user(&users, row.booking.user_id)?;
                Ok(BookingRecord {
                    details: row.into(),
                    user,
                })
            })
            .collect()
    }
}
