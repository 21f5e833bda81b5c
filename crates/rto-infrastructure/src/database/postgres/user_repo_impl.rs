// ============================================================================
// RTO Infrastructure - PostgreSQL User Repository
// File: crates/rto-infrastructure/src/database/postgres/user_repo_impl.rs
// ============================================================================

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;

use rto_core::domain::{SsoProfile, User};
use rto_core::error::DomainError;
use rto_core::repositories::UserRepository;
use rto_shared::utils::mask_email;

use crate::database::db_error;

pub(crate) const USER_COLUMNS: &str = "id, email, contact_email, first_name, last_name, \
     is_active, is_staff, date_joined, last_login";

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal row type for SQLx mapping
#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    pub id: i64,
    pub email: String,
    pub contact_email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            contact_email: row.contact_email,
            first_name: row.first_name,
            last_name: row.last_name,
            is_active: row.is_active,
            is_staff: row.is_staff,
            date_joined: row.date_joined,
            last_login: row.last_login,
        }
    }
}

#[derive(Debug, FromRow)]
struct UpsertedUserRow {
    #[sqlx(flatten)]
    user: UserRow,
    inserted: bool,
}

/// Loads several users at once, keyed by id.
pub(crate) async fn fetch_users(
    pool: &PgPool,
    ids: &[i64],
) -> Result<HashMap<i64, User>, DomainError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<UserRow> = sqlx::query_as(&format!(
        "SELECT {} FROM users WHERE id = ANY($1)",
        USER_COLUMNS
    ))
    .bind(ids)
    .fetch_all(pool)
    .await
    .map_err(db_error("loading users"))?;

    Ok(rows
        .into_iter()
        .map(|row| (row.id, User::from(row)))
        .collect())
}

pub(crate) fn take_user(users: &HashMap<i64, User>, id: i64) -> Result<User, DomainError> {
    users
        .get(&id)
        .cloned()
        .ok_or_else(|| DomainError::NotFound(format!("User {}", id)))
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("finding user by id"))?;

        Ok(row.map(|r| r.into()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM users
            WHERE LOWER(email) = LOWER($1)
               OR (contact_email <> '' AND LOWER(contact_email) = LOWER($1))
            ORDER BY id
            LIMIT 1
            "#,
            USER_COLUMNS
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding user by email"))?;

        Ok(row.map(|r| r.into()))
    }

    async fn get_or_create(
        &self,
        profile: &SsoProfile,
        now: DateTime<Utc>,
    ) -> Result<User, DomainError> {
        let row: UpsertedUserRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO users (email, contact_email, first_name, last_name, date_joined, last_login)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (email) DO UPDATE
                SET contact_email = EXCLUDED.contact_email,
                    last_login = EXCLUDED.last_login
            RETURNING {}, (xmax = 0) AS inserted
            "#,
            USER_COLUMNS
        ))
        .bind(&profile.email)
        .bind(&profile.contact_email)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("upserting user"))?;

        if row.inserted {
            info!("Created user {} for {}", row.user.id, mask_email(&profile.email));
        }
        Ok(row.user.into())
    }
}
