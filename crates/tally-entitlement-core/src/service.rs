//! Entitlement service
//!
//! Orchestrates repository access around the pure resolver: cached plan
//! reads, webhook-driven plan writes with the event-time guard, code
//! redemption, and the gated habit-creation path.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use tally_db::{
    AccountRepository, CreateHabit, HabitRepository, HabitRow, PlanEventUpdate,
    RedeemCodeRepository,
};
use tally_types::{AccountPlan, CodeStatus, Plan, UserId};

use crate::config::EntitlementConfig;
use crate::error::EntitlementError;
use crate::gates::{can_create_habit, history_window_days, CreateHabitDecision};
use crate::resolver::{resolve_effective, resolve_is_pro, LocalOverride};
use crate::webhook::{AccountKey, PlanAction, PlanChange};

/// Resolved entitlement state returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct EntitlementStatus {
    /// The resolved entitlement boolean; the single source of truth for gates
    pub is_pro: bool,
    /// Stored tier (may differ from `is_pro` for allow-listed or expired accounts)
    pub plan: Plan,
    /// Stored expiry, if any
    pub pro_expires_at: Option<DateTime<Utc>>,
    /// History window the client may query, in days
    pub history_days: u32,
}

/// What happened to a webhook-driven plan change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanChangeOutcome {
    /// The write landed
    Applied,
    /// The event was older than the stored token and skipped
    SkippedStale,
    /// No account matched the event's correlation key
    AccountNotFound,
}

impl PlanChangeOutcome {
    /// Label for logs and metrics
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::SkippedStale => "skipped_stale",
            Self::AccountNotFound => "account_not_found",
        }
    }
}

/// Entitlement service with a short-TTL plan cache.
///
/// The cache holds the raw account plan record, not the resolved boolean,
/// so expiry is still evaluated against the clock on every read.
pub struct EntitlementService<A, C, H> {
    accounts: Arc<A>,
    codes: Arc<C>,
    habits: Arc<H>,
    config: EntitlementConfig,
    plan_cache: Cache<Uuid, AccountPlan>,
}

impl<A, C, H> EntitlementService<A, C, H>
where
    A: AccountRepository,
    C: RedeemCodeRepository,
    H: HabitRepository,
{
    /// Create a new entitlement service
    pub fn new(accounts: Arc<A>, codes: Arc<C>, habits: Arc<H>, config: EntitlementConfig) -> Self {
        let plan_cache = Cache::builder()
            .time_to_live(config.plan_cache_ttl)
            .max_capacity(100_000)
            .build();

        Self {
            accounts,
            codes,
            habits,
            config,
            plan_cache,
        }
    }

    /// Service configuration
    pub fn config(&self) -> &EntitlementConfig {
        &self.config
    }

    /// Whether this email belongs to a privileged (allow-listed) identity.
    ///
    /// Used server-side for maintenance bypass and the habit-cap exemption.
    pub fn is_privileged(&self, email: &str) -> bool {
        self.config.allow_list.contains(email)
    }

    /// Fetch the account plan record, via the cache
    pub async fn account_plan(&self, user_id: &UserId) -> Result<AccountPlan, EntitlementError> {
        if let Some(plan) = self.plan_cache.get(&user_id.0).await {
            return Ok(plan);
        }

        let row = self
            .accounts
            .find_by_id(user_id.0)
            .await?
            .ok_or(EntitlementError::AccountNotFound)?;

        let plan = row.to_account_plan();
        self.plan_cache.insert(user_id.0, plan.clone()).await;

        Ok(plan)
    }

    /// Drop the cached record for a user (after any plan write)
    pub async fn invalidate(&self, user_id: &UserId) {
        self.plan_cache.invalidate(&user_id.0).await;
    }

    /// Resolve the effective entitlement for a user
    pub async fn resolve(&self, user_id: &UserId) -> Result<EntitlementStatus, EntitlementError> {
        let record = self.account_plan(user_id).await?;
        let is_pro = resolve_is_pro(&record, &self.config.allow_list, Utc::now());
        Ok(Self::status(&record, is_pro))
    }

    /// Resolve with the device-local "simulate free" flag applied.
    ///
    /// The flag is device state relayed by the client; it is honored only
    /// for the configured QA account and never persisted.
    pub async fn resolve_simulated(
        &self,
        user_id: &UserId,
        simulate_free: bool,
    ) -> Result<EntitlementStatus, EntitlementError> {
        let record = self.account_plan(user_id).await?;
        let local_override = self
            .config
            .test_account_email
            .as_ref()
            .map(|email| LocalOverride::new(email.clone(), simulate_free));
        let is_pro = resolve_effective(
            &record,
            &self.config.allow_list,
            local_override.as_ref(),
            Utc::now(),
        );
        Ok(Self::status(&record, is_pro))
    }

    fn status(record: &AccountPlan, is_pro: bool) -> EntitlementStatus {
        EntitlementStatus {
            is_pro,
            plan: record.plan,
            pro_expires_at: record.pro_expires_at,
            history_days: history_window_days(is_pro),
        }
    }

    /// Redeem a single-use code for a permanent Pro grant.
    ///
    /// The burn is atomic at the database; under concurrent redemption of
    /// one code exactly one caller succeeds and the rest see
    /// `CodeAlreadyUsed`. On success the account's plan becomes pro with no
    /// expiry and the cached record is dropped.
    pub async fn redeem_code(&self, code: &str, user_id: &UserId) -> Result<(), EntitlementError> {
        let account = self
            .accounts
            .find_by_id(user_id.0)
            .await?
            .ok_or(EntitlementError::AccountNotFound)?;

        let now = Utc::now();
        match self.codes.burn(code, account.id, now).await? {
            Some(burned) => {
                if let Err(e) = self
                    .accounts
                    .set_plan(account.id, &Plan::Pro.to_string(), None, now)
                    .await
                {
                    // The burn already landed; put the code back so a retry
                    // can succeed instead of reporting it as already used.
                    if let Err(release_err) = self.codes.release(burned.id).await {
                        error!(
                            code_id = %burned.id,
                            error = %release_err,
                            "Failed to release code after plan write failure"
                        );
                    }
                    return Err(e.into());
                }
                self.invalidate(user_id).await;
                info!(user_id = %user_id, code_id = %burned.id, "Code redeemed, pro granted");
                Ok(())
            }
            None => {
                // The burn didn't land; inspect the code to report why.
                let existing = self
                    .codes
                    .find_by_code(code)
                    .await?
                    .ok_or(EntitlementError::CodeNotFound)?;

                let expired_by_time = existing
                    .expires_at
                    .is_some_and(|expires_at| expires_at <= now);

                match existing.code_status() {
                    CodeStatus::Used => Err(EntitlementError::CodeAlreadyUsed),
                    CodeStatus::Expired => Err(EntitlementError::CodeExpired),
                    CodeStatus::Unused if expired_by_time => Err(EntitlementError::CodeExpired),
                    // Raced with a concurrent burn that hadn't landed when we
                    // read; treat as used.
                    CodeStatus::Unused => Err(EntitlementError::CodeAlreadyUsed),
                }
            }
        }
    }

    /// Apply a verified webhook plan change, guarded by event time.
    pub async fn apply_plan_change(
        &self,
        change: &PlanChange,
    ) -> Result<PlanChangeOutcome, EntitlementError> {
        let account = match &change.key {
            AccountKey::UserId(user_id) => self.accounts.find_by_id(user_id.0).await?,
            AccountKey::Email(email) => self.accounts.find_by_email(email).await?,
            AccountKey::PaymentCustomerId(customer_id) => {
                self.accounts
                    .find_by_payment_customer_id(customer_id)
                    .await?
            }
        };

        let Some(account) = account else {
            warn!(
                provider = change.provider.as_str(),
                key = ?change.key,
                "Webhook event did not match any account"
            );
            return Ok(PlanChangeOutcome::AccountNotFound);
        };

        let plan = match change.action {
            PlanAction::Activate => Plan::Pro,
            PlanAction::Deactivate => Plan::Free,
        };

        let applied = self
            .accounts
            .apply_plan_event(PlanEventUpdate {
                account_id: account.id,
                plan: plan.to_string(),
                pro_expires_at: None,
                payment_customer_id: change.customer_id.clone(),
                payment_subscription_id: change.subscription_id.clone(),
                event_at: change.event_at,
            })
            .await?;

        if applied {
            self.invalidate(&UserId(account.id)).await;
            info!(
                provider = change.provider.as_str(),
                account_id = %account.id,
                plan = %plan,
                event_at = %change.event_at,
                "Plan change applied"
            );
            Ok(PlanChangeOutcome::Applied)
        } else {
            info!(
                provider = change.provider.as_str(),
                account_id = %account.id,
                event_at = %change.event_at,
                "Plan change skipped as stale"
            );
            Ok(PlanChangeOutcome::SkippedStale)
        }
    }

    /// Create a habit, enforcing the free-tier cap server-side.
    pub async fn create_habit(
        &self,
        user_id: &UserId,
        name: &str,
    ) -> Result<HabitRow, EntitlementError> {
        let record = self.account_plan(user_id).await?;
        let is_pro = resolve_is_pro(&record, &self.config.allow_list, Utc::now());
        let privileged = self.is_privileged(&record.email);
        let active_count = self.habits.count_active_by_user(user_id.0).await?;

        match can_create_habit(is_pro, privileged, active_count, self.config.free_habit_limit) {
            CreateHabitDecision::Allowed => {
                let habit = self
                    .habits
                    .create(CreateHabit {
                        id: Uuid::new_v4(),
                        user_id: user_id.0,
                        name: name.to_string(),
                    })
                    .await?;
                Ok(habit)
            }
            CreateHabitDecision::UpgradeRequired { limit } => {
                Err(EntitlementError::UpgradeRequired { limit })
            }
        }
    }

    /// All habits for a user
    pub async fn list_habits(&self, user_id: &UserId) -> Result<Vec<HabitRow>, EntitlementError> {
        Ok(self.habits.find_by_user_id(user_id.0).await?)
    }
}

impl<A, C, H> std::fmt::Debug for EntitlementService<A, C, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntitlementService").finish()
    }
}
