//! Building repository trait (port)

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{Building, Floor, FloorAvailability};
use crate::error::DomainError;

#[async_trait]
pub trait BuildingRepository: Send + Sync {
    async fn list_buildings(&self) -> Result<Vec<Building>, DomainError>;
    async fn find_building(&self, id: i64) -> Result<Option<Building>, DomainError>;
    async fn find_floor(&self, id: i64) -> Result<Option<Floor>, DomainError>;

    /// Floors of a building ordered by name, with active bookings counted for `date`.
    async fn floor_availability(
        &self,
        building_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<FloorAvailability>, DomainError>;
}
