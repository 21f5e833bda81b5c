//! DIT group repository trait (port)

use async_trait::async_trait;

use crate::domain::DitGroup;
use crate::error::DomainError;

#[async_trait]
pub trait DitGroupRepository: Send + Sync {
    /// All groups ordered by name.
    async fn list(&self) -> Result<Vec<DitGroup>, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<DitGroup>, DomainError>;
}
