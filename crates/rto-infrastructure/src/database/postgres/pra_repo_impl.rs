// ============================================================================
// RTO Infrastructure - PostgreSQL PRA Repository
// File: crates/rto-infrastructure/src/database/postgres/pra_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::error;

use rto_core::domain::{MitigationOutcome, NewPra, Pra, PraParties, PraRecord, RiskCategory};
use rto_core::error::DomainError;
use rto_core::repositories::{FeedCursor, PraRepository};

use super::user_repo_impl::{fetch_users, take_user};
use crate::database::db_error;

const PRA_COLUMNS: &str = "id, staff_member_id, line_manager_id, scs_id, group_name, \
     business_unit, authorized_reason, risk_category, mitigation_outcome, mitigation_measures, \
     created_timestamp, approved_staff_member, approved_scs, migrated";

pub struct PgPraRepository {
    pool: PgPool,
}

impl PgPraRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: i64) -> Result<bool, DomainError> {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM pras WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("checking PRA"))?;
        Ok(exists)
    }

    /// Attaches the three parties to each PRA.
    async fn with_parties(&self, pras: Vec<Pra>) -> Result<Vec<PraRecord>, DomainError> {
        let ids: Vec<i64> = pras
            .iter()
            .flat_map(|p| [p.staff_member_id, p.line_manager_id, p.scs_id])
            .collect();
        let users = fetch_users(&self.pool, &ids).await?;

        pras.into_iter()
            .map(|pra| {
                Ok(PraRecord {
                    parties: PraParties {
                        staff_member: take_user(&users, pra.staff_member_id)?,
                        line_manager: take_user(&users, pra.line_manager_id)?,
                        scs: take_user(&users, pra.scs_id)?,
                    },
                    pra,
                })
            })
            .collect()
    }
}

// Internal row type for SQLx mapping
#[derive(Debug, FromRow)]
struct PraRow {
    id: i64,
    staff_member_id: i64,
    line_manager_id: i64,
    scs_id: i64,
    group_name: String,
    business_unit: String,
    authorized_reason: String,
    risk_category: String,
    mitigation_outcome: String,
    mitigation_measures: String,
    created_timestamp: DateTime<Utc>,
    approved_staff_member: Option<bool>,
    approved_scs: Option<bool>,
    migrated: bool,
}

impl TryFrom<PraRow> for Pra {
    type Error = DomainError;

    fn try_from(row: PraRow) -> Result<Self, Self::Error> {
        let risk_category = RiskCategory::from_str(&row.risk_category).ok_or_else(|| {
            error!("PRA {} has unknown risk category '{}'", row.id, row.risk_category);
            DomainError::DatabaseError(format!("unknown risk category '{}'", row.risk_category))
        })?;
        let mitigation_outcome = match row.mitigation_outcome.as_str() {
            "" => None,
            code => Some(MitigationOutcome::from_str(code).ok_or_else(|| {
                DomainError::DatabaseError(format!("unknown mitigation outcome '{}'", code))
            })?),
        };

        Ok(Pra {
            id: row.id,
            staff_member_id: row.staff_member_id,
            line_manager_id: row.line_manager_id,
            scs_id: row.scs_id,
            group: row.group_name,
            business_unit: row.business_unit,
            authorized_reason: row.authorized_reason,
            risk_category,
            mitigation_outcome,
            mitigation_measures: row.mitigation_measures,
            created_timestamp: row.created_timestamp,
            approved_staff_member: row.approved_staff_member,
            approved_scs: row.approved_scs,
            migrated: row.migrated,
        })
    }
}

#[async_trait]
impl PraRepository for PgPraRepository {
    async fn create(&self, pra: &NewPra) -> Result<Pra, DomainError> {
        let row: PraRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO pras (
                staff_member_id, line_manager_id, scs_id, group_name, business_unit,
                authorized_reason, risk_category, mitigation_outcome, mitigation_measures
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            PRA_COLUMNS
        ))
        .bind(pra.staff_member_id)
        .bind(pra.line_manager_id)
        .bind(pra.scs_id)
        .bind(&pra.group)
        .bind(&pra.business_unit)
        .bind(&pra.authorized_reason)
        .bind(pra.risk_category.as_str())
        .bind(pra.mitigation_outcome.map(|o| o.as_str()).unwrap_or_default())
        .bind(&pra.mitigation_measures)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("creating PRA"))?;

        row.try_into()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<PraRecord>, DomainError> {
        let row: Option<PraRow> =
            sqlx::query_as(&format!("SELECT {} FROM pras WHERE id = $1", PRA_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("finding PRA"))?;

        match row {
            Some(row) => Ok(self.with_parties(vec![row.try_into()?]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn record_staff_member_decision(
        &self,
        id: i64,
        approved: bool,
    ) -> Result<Pra, DomainError> {
        let row: Option<PraRow> = sqlx::query_as(&format!(
            r#"
            UPDATE pras SET approved_staff_member = $2
            WHERE id = $1 AND approved_staff_member IS NULL
            RETURNING {}
            "#,
            PRA_COLUMNS
        ))
        .bind(id)
        .bind(approved)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("recording staff member decision"))?;

        match row {
            Some(row) => row.try_into(),
            None if self.exists(id).await? => Err(DomainError::InvalidTransition(
                "PRA does not need staff member approval".to_string(),
            )),
            None => Err(DomainError::NotFound(format!("PRA {}", id))),
        }
    }

    async fn record_scs_decision(&self, id: i64, approved: bool) -> Result<Pra, DomainError> {
        let row: Option<PraRow> = sqlx::query_as(&format!(
            r#"
            UPDATE pras SET approved_scs = $2
            WHERE id = $1 AND approved_staff_member = TRUE AND approved_scs IS NULL
            RETURNING {}
            "#,
            PRA_COLUMNS
        ))
        .bind(id)
        .bind(approved)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("recording SCS decision"))?;

        match row {
            Some(row) => row.try_into(),
            None if self.exists(id).await? => Err(DomainError::InvalidTransition(
                "PRA does not need SCS approval".to_string(),
            )),
            None => Err(DomainError::NotFound(format!("PRA {}", id))),
        }
    }

    async fn feed_page(
        &self,
        after: Option<FeedCursor>,
        limit: u32,
    ) -> Result<Vec<PraRecord>, DomainError> {
        let rows: Vec<PraRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM pras
            WHERE $1::timestamptz IS NULL OR (created_timestamp, id) > ($1, $2)
            ORDER BY created_timestamp, id
            LIMIT $3
            "#,
            PRA_COLUMNS
        ))
        .bind(after.map(|c| c.timestamp))
        .bind(after.map(|c| c.id).unwrap_or_default())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("reading PRA feed"))?;

        let pras = rows
            .into_iter()
            .map(Pra::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        self.with_parties(pras).await
    }
}
