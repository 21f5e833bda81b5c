//! Server-side session store (port)

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DomainError;

/// JSON object stored per session key.
pub type SessionData = serde_json::Map<String, serde_json::Value>;

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Returns the data of an unexpired session.
    async fn load(&self, key: &str, now: DateTime<Utc>) -> Result<Option<SessionData>, DomainError>;

    async fn save(
        &self,
        key: &str,
        data: &SessionData,
        expire_date: DateTime<Utc>,
    ) -> Result<(), DomainError>;

    async fn delete(&self, key: &str) -> Result<(), DomainError>;
}
