//! PostgreSQL redeemable code repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::RedeemCodeRow;
use crate::repo::{CreateRedeemCode, RedeemCodeRepository};

const CODE_COLUMNS: &str = "id, code, status, expires_at, redeemed_by, redeemed_at, created_at";

/// PostgreSQL redeemable code repository
#[derive(Clone)]
pub struct PgRedeemCodeRepository {
    pool: PgPool,
}

impl PgRedeemCodeRepository {
    /// Create a new redeemable code repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RedeemCodeRepository for PgRedeemCodeRepository {
    async fn find_by_code(&self, code: &str) -> DbResult<Option<RedeemCodeRow>> {
        let row = sqlx::query_as::<_, RedeemCodeRow>(&format!(
            "SELECT {CODE_COLUMNS} FROM redeem_codes WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn create(&self, code: CreateRedeemCode) -> DbResult<RedeemCodeRow> {
        let row = sqlx::query_as::<_, RedeemCodeRow>(&format!(
            "INSERT INTO redeem_codes (id, code, status, expires_at) \
             VALUES ($1, $2, 'unused', $3) \
             RETURNING {CODE_COLUMNS}"
        ))
        .bind(code.id)
        .bind(&code.code)
        .bind(code.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn burn(
        &self,
        code: &str,
        redeemed_by: Uuid,
        now: DateTime<Utc>,
    ) -> DbResult<Option<RedeemCodeRow>> {
        // Burn-on-use in one conditional update: under concurrent redemption
        // exactly one caller matches the 'unused' predicate and gets the row.
        let row = sqlx::query_as::<_, RedeemCodeRow>(&format!(
            "UPDATE redeem_codes \
             SET status = 'used', redeemed_by = $2, redeemed_at = $3 \
             WHERE code = $1 \
               AND status = 'unused' \
               AND (expires_at IS NULL OR expires_at > $3) \
             RETURNING {CODE_COLUMNS}"
        ))
        .bind(code)
        .bind(redeemed_by)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn release(&self, id: Uuid) -> DbResult<()> {
        sqlx::query(
            "UPDATE redeem_codes \
             SET status = 'unused', redeemed_by = NULL, redeemed_at = NULL \
             WHERE id = $1 AND status = 'used'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
