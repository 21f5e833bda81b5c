//! PRA repository trait (port)

use async_trait::async_trait;

use super::FeedCursor;
use crate::domain::{NewPra, Pra, PraRecord};
use crate::error::DomainError;

#[async_trait]
pub trait PraRepository: Send + Sync {
    async fn create(&self, pra: &NewPra) -> Result<Pra, DomainError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<PraRecord>, DomainError>;

    /// Records the staff member's decision only while it is still pending.
    /// Returns `InvalidTransition` if a decision already exists.
    async fn record_staff_member_decision(
        &self,
        id: i64,
        approved: bool,
    ) -> Result<Pra, DomainError>;

    /// Records the SCS decision only while the staff member has approved and
    /// the SCS has not decided yet.
    async fn record_scs_decision(&self, id: i64, approved: bool) -> Result<Pra, DomainError>;

    /// PRAs ordered by (created_timestamp, id), strictly after `after`.
    async fn feed_page(
        &self,
        after: Option<FeedCursor>,
        limit: u32,
    ) -> Result<Vec<PraRecord>, DomainError>;
}
