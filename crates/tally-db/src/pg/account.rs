//! PostgreSQL account repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::AccountRow;
use crate::repo::{AccountRepository, CreateAccount, PlanEventUpdate};

const ACCOUNT_COLUMNS: &str = "id, email, plan, pro_expires_at, payment_customer_id, \
                               payment_subscription_id, plan_event_at, created_at, updated_at";

/// PostgreSQL account repository
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    /// Create a new account repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<AccountRow>> {
        let account = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<AccountRow>> {
        let account = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn find_by_payment_customer_id(
        &self,
        customer_id: &str,
    ) -> DbResult<Option<AccountRow>> {
        let account = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE payment_customer_id = $1"
        ))
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn create(&self, account: CreateAccount) -> DbResult<AccountRow> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "INSERT INTO accounts (id, email, plan) VALUES ($1, $2, 'free') \
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(account.id)
        .bind(&account.email)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn set_plan(
        &self,
        id: Uuid,
        plan: &str,
        pro_expires_at: Option<DateTime<Utc>>,
        event_at: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE accounts
            SET plan = $1, pro_expires_at = $2, plan_event_at = $3, updated_at = now()
            WHERE id = $4
            "#,
        )
        .bind(plan)
        .bind(pro_expires_at)
        .bind(event_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn apply_plan_event(&self, update: PlanEventUpdate) -> DbResult<bool> {
        // Event-time guard: only apply when strictly newer than the stored
        // token, so replayed or out-of-order webhook deliveries are no-ops.
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET plan = $1,
                pro_expires_at = $2,
                payment_customer_id = COALESCE($3, payment_customer_id),
                payment_subscription_id = COALESCE($4, payment_subscription_id),
                plan_event_at = $5,
                updated_at = now()
            WHERE id = $6
              AND (plan_event_at IS NULL OR plan_event_at < $5)
            "#,
        )
        .bind(&update.plan)
        .bind(update.pro_expires_at)
        .bind(&update.payment_customer_id)
        .bind(&update.payment_subscription_id)
        .bind(update.event_at)
        .bind(update.account_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
