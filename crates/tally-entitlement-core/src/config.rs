//! Entitlement configuration

use std::time::Duration;

use crate::resolver::AllowList;
use tally_types::FREE_HABIT_LIMIT;

/// Entitlement service configuration
#[derive(Debug, Clone)]
pub struct EntitlementConfig {
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
    /// Lemon Squeezy webhook signing secret
    pub lemon_webhook_secret: String,
    /// Privileged identities that always resolve Pro
    pub allow_list: AllowList,
    /// Designated QA account honored by the local "simulate free" override
    pub test_account_email: Option<String>,
    /// Free-tier concurrent habit cap
    pub free_habit_limit: i64,
    /// TTL for the cached account plan record
    pub plan_cache_ttl: Duration,
}

impl EntitlementConfig {
    /// Create a new config with the built-in allow-list and default limits
    pub fn new(
        stripe_webhook_secret: impl Into<String>,
        lemon_webhook_secret: impl Into<String>,
    ) -> Self {
        Self {
            stripe_webhook_secret: stripe_webhook_secret.into(),
            lemon_webhook_secret: lemon_webhook_secret.into(),
            allow_list: AllowList::builtin(),
            test_account_email: None,
            free_habit_limit: FREE_HABIT_LIMIT,
            plan_cache_ttl: Duration::from_secs(60),
        }
    }

    /// Replace the allow-list
    pub fn with_allow_list(mut self, allow_list: AllowList) -> Self {
        self.allow_list = allow_list;
        self
    }

    /// Set the designated QA account email
    pub fn with_test_account(mut self, email: impl Into<String>) -> Self {
        self.test_account_email = Some(email.into().to_lowercase());
        self
    }

    /// Set the free-tier habit cap
    pub fn with_free_habit_limit(mut self, limit: i64) -> Self {
        self.free_habit_limit = limit;
        self
    }

    /// Set the plan cache TTL
    pub fn with_plan_cache_ttl(mut self, ttl: Duration) -> Self {
        self.plan_cache_ttl = ttl;
        self
    }
}
