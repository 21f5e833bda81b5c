//! # RTO Infrastructure
//!
//! PostgreSQL repositories and the GOV.UK Notify client (adapters).

pub mod database;
pub mod notify;

pub use database::{
    create_pool, run_migrations, PgBookingRepository, PgBuildingRepository, PgDitGroupRepository,
    PgHealthRepository, PgPraRepository, PgSessionRepository, PgUserRepository,
};
pub use notify::{GovUkNotifyClient, LoggingNotifier};
