//! Repository traits
//!
//! Define async repository interfaces for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::*;

/// Account repository trait
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Find an account by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<AccountRow>>;

    /// Find an account by email
    async fn find_by_email(&self, email: &str) -> DbResult<Option<AccountRow>>;

    /// Find an account by payment provider customer ID
    async fn find_by_payment_customer_id(&self, customer_id: &str)
        -> DbResult<Option<AccountRow>>;

    /// Create a new account (defaults to the free plan)
    async fn create(&self, account: CreateAccount) -> DbResult<AccountRow>;

    /// Unconditionally set the plan fields.
    ///
    /// For user-initiated writes (code redemption, admin action); stamps
    /// `plan_event_at` so later out-of-order webhook events cannot clobber
    /// the grant.
    async fn set_plan(
        &self,
        id: Uuid,
        plan: &str,
        pro_expires_at: Option<DateTime<Utc>>,
        event_at: DateTime<Utc>,
    ) -> DbResult<()>;

    /// Conditionally apply a webhook-driven plan write.
    ///
    /// The update only lands when `event_at` is strictly newer than the
    /// stored `plan_event_at` (or none is stored yet). Returns whether a row
    /// was updated; `false` means the event was stale and skipped.
    async fn apply_plan_event(&self, update: PlanEventUpdate) -> DbResult<bool>;

    /// Delete an account (cascades to habits, logs, codes via FK)
    async fn delete(&self, id: Uuid) -> DbResult<()>;
}

/// Create account input
#[derive(Debug, Clone)]
pub struct CreateAccount {
    pub id: Uuid,
    pub email: String,
}

/// Webhook-driven plan write, guarded by event time
#[derive(Debug, Clone)]
pub struct PlanEventUpdate {
    /// Target account
    pub account_id: Uuid,
    /// New plan value
    pub plan: String,
    /// New expiry (None clears it)
    pub pro_expires_at: Option<DateTime<Utc>>,
    /// Provider customer reference, kept if None
    pub payment_customer_id: Option<String>,
    /// Provider subscription reference, kept if None
    pub payment_subscription_id: Option<String>,
    /// Provider event timestamp; the optimistic concurrency token
    pub event_at: DateTime<Utc>,
}

/// Redeemable code repository trait
#[async_trait]
pub trait RedeemCodeRepository: Send + Sync {
    /// Find a code by its identifier string
    async fn find_by_code(&self, code: &str) -> DbResult<Option<RedeemCodeRow>>;

    /// Create a new code
    async fn create(&self, code: CreateRedeemCode) -> DbResult<RedeemCodeRow>;

    /// Atomically burn an unused, unexpired code.
    ///
    /// Single conditional update: at most one concurrent caller gets the
    /// row back; everyone else gets `None` and must inspect the code to
    /// report why.
    async fn burn(
        &self,
        code: &str,
        redeemed_by: Uuid,
        now: DateTime<Utc>,
    ) -> DbResult<Option<RedeemCodeRow>>;

    /// Put a burned code back to unused.
    ///
    /// Compensation for a failed plan write after a successful burn; the
    /// code must not stay consumed without the grant it paid for.
    async fn release(&self, id: Uuid) -> DbResult<()>;
}

/// Create redeemable code input
#[derive(Debug, Clone)]
pub struct CreateRedeemCode {
    pub id: Uuid,
    pub code: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Habit repository trait
#[async_trait]
pub trait HabitRepository: Send + Sync {
    /// Find a habit by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<HabitRow>>;

    /// All habits for a user, newest first
    async fn find_by_user_id(&self, user_id: Uuid) -> DbResult<Vec<HabitRow>>;

    /// Count non-archived habits for a user (free-tier cap input)
    async fn count_active_by_user(&self, user_id: Uuid) -> DbResult<i64>;

    /// Create a new habit
    async fn create(&self, habit: CreateHabit) -> DbResult<HabitRow>;

    /// Archive a habit (stops counting toward the cap)
    async fn archive(&self, id: Uuid) -> DbResult<()>;
}

/// Create habit input
#[derive(Debug, Clone)]
pub struct CreateHabit {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
}
