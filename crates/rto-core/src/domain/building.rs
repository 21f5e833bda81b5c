//! Buildings and their floors

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Floor {
    pub id: i64,
    pub building_id: i64,
    pub name: String,
    pub nr_of_desks: i32,
}

/// Desk usage of one floor on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorAvailability {
    pub floor: Floor,
    pub booked: i64,
}

impl FloorAvailability {
    pub fn available(&self) -> i64 {
        (i64::from(self.floor.nr_of_desks) - self.booked).max(0)
    }

    pub fn is_full(&self) -> bool {
        self.available() == 0
    }
}
