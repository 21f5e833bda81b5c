//! PostgreSQL session store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;

use rto_core::error::DomainError;
use rto_core::repositories::{SessionData, SessionRepository};

use crate::database::db_error;

pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Removes sessions past their expiry date.
    pub async fn clear_expired(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expire_date <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(db_error("clearing expired sessions"))?;

        info!("Cleared {} expired session(s)", result.rows_affected());
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn load(&self, key: &str, now: DateTime<Utc>) -> Result<Option<SessionData>, DomainError> {
        let row: Option<(Json<SessionData>,)> = sqlx::query_as(
            "SELECT data FROM sessions WHERE session_key = $1 AND expire_date > $2",
        )
        .bind(key)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("loading session"))?;

        Ok(row.map(|(Json(data),)| data))
    }

    async fn save(
        &self,
        key: &str,
        data: &SessionData,
        expire_date: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (session_key, data, expire_date)
            VALUES ($1, $2, $3)
            ON CONFLICT (session_key) DO UPDATE
                SET data = EXCLUDED.data, expire_date = EXCLUDED.expire_date
            "#,
        )
        .bind(key)
        .bind(Json(data))
        .bind(expire_date)
        .execute(&self.pool)
        .await
        .map_err(db_error("saving session"))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM sessions WHERE session_key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(db_error("deleting session"))?;
        Ok(())
    }
}
