//! PostgreSQL DIT group repository

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use rto_core::domain::DitGroup;
use rto_core::error::DomainError;
use rto_core::repositories::DitGroupRepository;

use crate::database::db_error;

pub struct PgDitGroupRepository {
    pool: PgPool,
}

impl PgDitGroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct DitGroupRow {
    id: i64,
    name: String,
    business_units: String,
}

impl From<DitGroupRow> for DitGroup {
    fn from(row: DitGroupRow) -> Self {
        DitGroup {
            id: row.id,
            name: row.name,
            business_units: row.business_units,
        }
    }
}

#[async_trait]
impl DitGroupRepository for PgDitGroupRepository {
    async fn list(&self) -> Result<Vec<DitGroup>, DomainError> {
        let rows: Vec<DitGroupRow> =
            sqlx::query_as("SELECT id, name, business_units FROM dit_groups ORDER BY name")
                .fetch_all(&self.pool)
                .await
                .map_err(db_error("listing DIT groups"))?;

        Ok(rows.into_iter().map(DitGroup::from).collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<DitGroup>, DomainError> {
        let row: Option<DitGroupRow> =
            sqlx::query_as("SELECT id, name, business_units FROM dit_groups WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("finding DIT group"))?;

        Ok(row.map(DitGroup::from))
    }
}
