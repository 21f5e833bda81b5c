//! Storage liveness probe (port)

use async_trait::async_trait;

use crate::error::DomainError;

#[async_trait]
pub trait HealthRepository: Send + Sync {
    /// Succeeds when the store answers a trivial query.
    async fn ping(&self) -> Result<(), DomainError>;
}
