//! Account plan record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Plan, UserId};

/// The plan-bearing portion of an account record.
///
/// This is the shared server-owned state that the webhook reconcilers, the
/// code-redemption path, and admin actions all write to. Clients only ever
/// read it; entitlement is resolved from it on every read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountPlan {
    /// Account owner
    pub user_id: UserId,
    /// Account email (correlation key for webhooks and allow-list checks)
    pub email: String,
    /// Authoritative tier
    pub plan: Plan,
    /// If set and in the past, `plan = pro` is treated as expired.
    /// Absent means a non-expiring manual grant.
    pub pro_expires_at: Option<DateTime<Utc>>,
    /// Payment provider customer reference, used to reconcile cancellations
    pub payment_customer_id: Option<String>,
    /// Payment provider subscription reference
    pub payment_subscription_id: Option<String>,
    /// Provider event time of the last applied plan write.
    ///
    /// Concurrency token: webhook writes only apply when their event time is
    /// strictly newer than this, so out-of-order deliveries from either
    /// provider cannot regress the record.
    pub plan_event_at: Option<DateTime<Utc>>,
}

impl AccountPlan {
    /// A fresh free-tier record, as created at signup.
    pub fn new_free(user_id: UserId, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
            plan: Plan::Free,
            pro_expires_at: None,
            payment_customer_id: None,
            payment_subscription_id: None,
            plan_event_at: None,
        }
    }
}
