//! PostgreSQL implementation of PurchaseRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{CourseId, DomainError, PurchaseId, Timestamp, UserId};
use crate::domain::purchase::{Purchase, PurchaseStatus};
use crate::ports::PurchaseRepository;

use super::{corrupt_row, db_error};

pub struct PostgresPurchaseRepository {
    pool: PgPool,
}

impl PostgresPurchaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PurchaseRow {
    id: String,
    user_id: String,
    course_id: String,
    amount: i64,
    currency: String,
    status: String,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PurchaseRow> for Purchase {
    type Error = DomainError;

    fn try_from(row: PurchaseRow) -> Result<Self, Self::Error> {
        let status: PurchaseStatus = row
            .status
            .parse()
            .map_err(|e| corrupt_row("purchases.status", e))?;

        Ok(Purchase {
            id: PurchaseId::new(row.id).map_err(|e| corrupt_row("purchases.id", e))?,
            user_id: UserId::new(row.user_id).map_err(|e| corrupt_row("purchases.user_id", e))?,
            course_id: CourseId::new(row.course_id)
                .map_err(|e| corrupt_row("purchases.course_id", e))?,
            amount: row.amount,
            currency: row.currency,
            status,
            version: row.version,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[async_trait]
impl PurchaseRepository for PostgresPurchaseRepository {
    async fn find_by_id(&self, id: &PurchaseId) -> Result<Option<Purchase>, DomainError> {
        let row: Option<PurchaseRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, course_id, amount, currency, status, version, created_at, updated_at
            FROM purchases
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find purchase", e))?;

        row.map(Purchase::try_from).transpose()
    }

    async fn save(&self, purchase: &Purchase) -> Result<i64, DomainError> {
        // Update guarded by the version the caller loaded.
        let updated: Option<(i64,)> = sqlx::query_as(
            r#"
            UPDATE purchases SET
                status = $3,
                amount = $4,
                currency = $5,
                updated_at = $6,
                version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING version
            "#,
        )
        .bind(purchase.id.as_str())
        .bind(purchase.version)
        .bind(purchase.status.as_str())
        .bind(purchase.amount)
        .bind(&purchase.currency)
        .bind(purchase.updated_at.as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("update purchase", e))?;

        if let Some((version,)) = updated {
            return Ok(version);
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO purchases (id, user_id, course_id, amount, currency, status, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(purchase.id.as_str())
        .bind(purchase.user_id.as_str())
        .bind(purchase.course_id.as_str())
        .bind(purchase.amount)
        .bind(&purchase.currency)
        .bind(purchase.status.as_str())
        .bind(purchase.version)
        .bind(purchase.created_at.as_datetime())
        .bind(purchase.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert purchase", e))?;

        if inserted.rows_affected() == 0 {
            return Err(DomainError::conflict(format!(
                "purchase {} was modified concurrently (expected version {})",
                purchase.id, purchase.version
            )));
        }

        Ok(purchase.version)
    }
}
