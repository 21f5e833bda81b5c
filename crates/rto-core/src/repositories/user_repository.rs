//! User repository trait (port)

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{SsoProfile, User};
use crate::error::DomainError;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DomainError>;

    /// Matches the login email or the contact email, ignoring case.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// Fetches the user with `profile.email` or creates them. Names are only
    /// set on creation; the contact email is refreshed when it changed and
    /// `last_login` is set to `now`.
    async fn get_or_create(
        &self,
        profile: &SsoProfile,
        now: DateTime<Utc>,
    ) -> Result<User, DomainError>;
}
