//! Database module (PostgreSQL adapters)

pub mod connection;
pub mod postgres;

pub use connection::{create_pool, run_migrations};
pub use postgres::{
    PgBookingRepository, PgBuildingRepository, PgDitGroupRepository, PgHealthRepository,
    PgPraRepository, PgSessionRepository, PgUserRepository,
};

use rto_core::error::DomainError;
use tracing::error;

/// Logs a storage failure and maps it into the domain error.
pub(crate) fn db_error(context: &str) -> impl Fn(sqlx::Error) -> DomainError + '_ {
    move |e: sqlx::Error| {
        error!("Database error {}: {}", context, e);
        DomainError::DatabaseError(e.to_string())
    }
}
