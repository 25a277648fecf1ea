//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use tally_types::{AccountPlan, CodeStatus, Plan, UserId};

/// Account row from the database
#[derive(Debug, Clone, FromRow)]
pub struct AccountRow {
    pub id: Uuid,
    pub email: String,
    pub plan: String,
    pub pro_expires_at: Option<DateTime<Utc>>,
    pub payment_customer_id: Option<String>,
    pub payment_subscription_id: Option<String>,
    pub plan_event_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccountRow {
    /// Convert to domain UserId
    pub fn user_id(&self) -> UserId {
        UserId(self.id)
    }

    /// Normalize the stored row into the domain plan record.
    ///
    /// The stored `plan` column is a free-form string; unknown values read
    /// as free rather than failing the whole fetch.
    pub fn to_account_plan(&self) -> AccountPlan {
        AccountPlan {
            user_id: UserId(self.id),
            email: self.email.clone(),
            plan: Plan::from_stored(Some(self.plan.as_str())),
            pro_expires_at: self.pro_expires_at,
            payment_customer_id: self.payment_customer_id.clone(),
            payment_subscription_id: self.payment_subscription_id.clone(),
            plan_event_at: self.plan_event_at,
        }
    }
}

/// Redeemable code row from the database
#[derive(Debug, Clone, FromRow)]
pub struct RedeemCodeRow {
    pub id: Uuid,
    pub code: String,
    pub status: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub redeemed_by: Option<Uuid>,
    pub redeemed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl RedeemCodeRow {
    /// Parsed lifecycle status; unknown stored values read as expired,
    /// which can only under-grant.
    pub fn code_status(&self) -> CodeStatus {
        self.status.parse().unwrap_or(CodeStatus::Expired)
    }
}

/// Habit row from the database
#[derive(Debug, Clone, FromRow)]
pub struct HabitRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
}
