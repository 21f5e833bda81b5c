//! PostgreSQL repository implementations

pub mod booking_repo_impl;
pub mod building_repo_impl;
pub mod dit_group_repo_impl;
pub mod health_repo_impl;
pub mod pra_repo_impl;
pub mod session_repo_impl;
pub mod user_repo_impl;

pub use booking_repo_impl::PgBookingRepository;
pub use building_repo_impl::PgBuildingRepository;
pub use dit_group_repo_impl::PgDitGroupRepository;
pub use health_repo_impl::PgHealthRepository;
pub use pra_repo_impl::PgPraRepository;
pub use session_repo_impl::PgSessionRepository;
pub use user_repo_impl::PgUserRepository;
