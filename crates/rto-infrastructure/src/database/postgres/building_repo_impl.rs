//! PostgreSQL building and floor repository

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};

use rto_core::domain::{Building, Floor, FloorAvailability};
use rto_core::error::DomainError;
use rto_core::repositories::BuildingRepository;

use crate::database::db_error;

pub struct PgBuildingRepository {
    pool: PgPool,
}

impl PgBuildingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct BuildingRow {
    id: i64,
    name: String,
}

impl From<BuildingRow> for Building {
    fn from(row: BuildingRow) -> Self {
        Building {
            id: row.id,
            name: row.name,
        }
    }
}

#[derive(Debug, FromRow)]
struct FloorRow {
    id: i64,
    building_id: i64,
    name: String,
    nr_of_desks: i32,
}

impl From<FloorRow> for Floor {
    fn from(row: FloorRow) -> Self {
        Floor {
            id: row.id,
            building_id: row.building_id,
            name: row.name,
            nr_of_desks: row.nr_of_desks,
        }
    }
}

#[derive(Debug, FromRow)]
struct FloorAvailabilityRow {
    #[sqlx(flatten)]
    floor: FloorRow,
    booked: i64,
}

#[async_trait]
impl BuildingRepository for PgBuildingRepository {
    async fn list_buildings(&self) -> Result<Vec<Building>, DomainError> {
        let rows: Vec<BuildingRow> = sqlx::query_as("SELECT id, name FROM buildings ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("listing buildings"))?;

        Ok(rows.into_iter().map(Building::from).collect())
    }

    async fn find_building(&self, id: i64) -> Result<Option<Building>, DomainError> {
        let row: Option<BuildingRow> = sqlx::query_as("SELECT id, name FROM buildings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("finding building"))?;

        Ok(row.map(Building::from))
    }

    async fn find_floor(&self, id: i64) -> Result<Option<Floor>, DomainError> {
        let row: Option<FloorRow> = sqlx::query_as(
            "SELECT id, building_id, name, nr_of_desks FROM floors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding floor"))?;

        Ok(row.map(Floor::from))
    }

    async fn floor_availability(
        &self,
        building_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<FloorAvailability>, DomainError> {
        let rows: Vec<FloorAvailabilityRow> = sqlx::query_as(
            r#"
            SELECT f.id, f.building_id, f.name, f.nr_of_desks, COUNT(b.id) AS booked
            FROM floors f
            LEFT JOIN bookings b
                ON b.floor_id = f.id AND b.booking_date = $2 AND b.is_active
            WHERE f.building_id = $1
            GROUP BY f.id
            ORDER BY f.name
            "#,
        )
        .bind(building_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("counting floor bookings"))?;

        Ok(rows
            .into_iter()
            .map(|row| FloorAvailability {
                floor: row.floor.into(),
                booked: row.booked,
            })
            .collect())
    }
}
