//! DIT group entity

use rto_shared::constants::UNKNOWN_BUSINESS_UNIT;
use rto_shared::utils::non_blank_lines;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DitGroup {
    pub id: i64,
    pub name: String,
    /// One business unit per line.
    pub business_units: String,
}

impl DitGroup {
    /// Trimmed, non-blank business units. Never empty.
    pub fn business_units(&self) -> Vec<String> {
        let units = non_blank_lines(&self.business_units);
        if units.is_empty() {
            vec![UNKNOWN_BUSINESS_UNIT.to_string()]
        } else {
            units
        }
    }

    pub fn has_business_unit(&self, business_unit: &str) -> bool {
        self.business_units().iter().any(|b| b == business_unit)
    }
}
