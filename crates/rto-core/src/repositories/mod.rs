//! Repository traits (ports)

pub mod booking_repository;
pub mod building_repository;
pub mod dit_group_repository;
pub mod health_repository;
pub mod pra_repository;
pub mod session_repository;
pub mod user_repository;

pub use booking_repository::BookingRepository;
pub use building_repository::BuildingRepository;
pub use dit_group_repository::DitGroupRepository;
pub use health_repository::HealthRepository;
pub use pra_repository::PraRepository;
pub use session_repository::{SessionData, SessionRepository};
pub use user_repository::UserRepository;

use chrono::{DateTime, Utc};

/// Position in a (timestamp, id) ordered feed. Pages resume strictly after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedCursor {
    pub timestamp: DateTime<Utc>,
    pub id: i64,
}
