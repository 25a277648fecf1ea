//! Mock repositories for testing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use tally_db::{
    AccountRepository, AccountRow, CreateAccount, CreateHabit, CreateRedeemCode, DbError, DbResult,
    HabitRepository, HabitRow, PlanEventUpdate, RedeemCodeRepository, RedeemCodeRow,
};

/// In-memory account repository for testing
#[derive(Default, Clone)]
pub struct MockAccountRepository {
    accounts: Arc<DashMap<Uuid, AccountRow>>,
    by_email: Arc<DashMap<String, Uuid>>,
    fail_plan_writes: Arc<AtomicBool>,
}

impl MockAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a test account directly
    pub fn insert_account(&self, account: AccountRow) {
        self.by_email.insert(account.email.clone(), account.id);
        self.accounts.insert(account.id, account);
    }

    /// A fresh free-tier account row
    pub fn free_account(email: &str) -> AccountRow {
        AccountRow {
            id: Uuid::new_v4(),
            email: email.to_string(),
            plan: "free".to_string(),
            pro_expires_at: None,
            payment_customer_id: None,
            payment_subscription_id: None,
            plan_event_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Read an account back for assertions
    pub fn get(&self, id: Uuid) -> Option<AccountRow> {
        self.accounts.get(&id).map(|r| r.value().clone())
    }

    /// Make subsequent plan writes fail (fault injection)
    pub fn fail_plan_writes(&self, fail: bool) {
        self.fail_plan_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl AccountRepository for MockAccountRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<AccountRow>> {
        Ok(self.accounts.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<AccountRow>> {
        Ok(self
            .by_email
            .get(email)
            .and_then(|id| self.accounts.get(id.value()).map(|r| r.value().clone())))
    }

    async fn find_by_payment_customer_id(
        &self,
        customer_id: &str,
    ) -> DbResult<Option<AccountRow>> {
        Ok(self
            .accounts
            .iter()
            .find(|r| r.payment_customer_id.as_deref() == Some(customer_id))
            .map(|r| r.value().clone()))
    }

    async fn create(&self, account: CreateAccount) -> DbResult<AccountRow> {
        let row = AccountRow {
            id: account.id,
            email: account.email.clone(),
            plan: "free".to_string(),
            pro_expires_at: None,
            payment_customer_id: None,
            payment_subscription_id: None,
            plan_event_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.insert_account(row.clone());
        Ok(row)
    }

    async fn set_plan(
        &self,
        id: Uuid,
        plan: &str,
        pro_expires_at: Option<DateTime<Utc>>,
        event_at: DateTime<Utc>,
    ) -> DbResult<()> {
        if self.fail_plan_writes.load(Ordering::SeqCst) {
            return Err(DbError::NotFound);
        }
        if let Some(mut account) = self.accounts.get_mut(&id) {
            account.plan = plan.to_string();
            account.pro_expires_at = pro_expires_at;
            account.plan_event_at = Some(event_at);
            account.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn apply_plan_event(&self, update: PlanEventUpdate) -> DbResult<bool> {
        // Same guard semantics as the SQL: apply only when strictly newer
        let Some(mut account) = self.accounts.get_mut(&update.account_id) else {
            return Ok(false);
        };

        if let Some(stored) = account.plan_event_at {
            if stored >= update.event_at {
                return Ok(false);
            }
        }

        account.plan = update.plan;
        account.pro_expires_at = update.pro_expires_at;
        if update.payment_customer_id.is_some() {
            account.payment_customer_id = update.payment_customer_id;
        }
        if update.payment_subscription_id.is_some() {
            account.payment_subscription_id = update.payment_subscription_id;
        }
        account.plan_event_at = Some(update.event_at);
        account.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        if let Some((_, account)) = self.accounts.remove(&id) {
            self.by_email.remove(&account.email);
        }
        Ok(())
    }
}

/// In-memory redeemable code repository for testing
#[derive(Default, Clone)]
pub struct MockRedeemCodeRepository {
    codes: Arc<DashMap<String, RedeemCodeRow>>,
}

impl MockRedeemCodeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an unused code
    pub fn insert_unused(&self, code: &str, expires_at: Option<DateTime<Utc>>) {
        self.codes.insert(
            code.to_string(),
            RedeemCodeRow {
                id: Uuid::new_v4(),
                code: code.to_string(),
                status: "unused".to_string(),
                expires_at,
                redeemed_by: None,
                redeemed_at: None,
                created_at: Utc::now(),
            },
        );
    }

    /// Read a code back for assertions
    pub fn get(&self, code: &str) -> Option<RedeemCodeRow> {
        self.codes.get(code).map(|r| r.value().clone())
    }
}

#[async_trait]
impl RedeemCodeRepository for MockRedeemCodeRepository {
    async fn find_by_code(&self, code: &str) -> DbResult<Option<RedeemCodeRow>> {
        Ok(self.codes.get(code).map(|r| r.value().clone()))
    }

    async fn create(&self, code: CreateRedeemCode) -> DbResult<RedeemCodeRow> {
        let row = RedeemCodeRow {
            id: code.id,
            code: code.code.clone(),
            status: "unused".to_string(),
            expires_at: code.expires_at,
            redeemed_by: None,
            redeemed_at: None,
            created_at: Utc::now(),
        };
        self.codes.insert(code.code, row.clone());
        Ok(row)
    }

    async fn burn(
        &self,
        code: &str,
        redeemed_by: Uuid,
        now: DateTime<Utc>,
    ) -> DbResult<Option<RedeemCodeRow>> {
        // The shard lock held by get_mut makes check-and-set atomic,
        // mirroring the single conditional UPDATE in Postgres.
        let Some(mut row) = self.codes.get_mut(code) else {
            return Ok(None);
        };

        let expired = row.expires_at.is_some_and(|e| e <= now);
        if row.status != "unused" || expired {
            return Ok(None);
        }

        row.status = "used".to_string();
        row.redeemed_by = Some(redeemed_by);
        row.redeemed_at = Some(now);
        Ok(Some(row.value().clone()))
    }

    async fn release(&self, id: Uuid) -> DbResult<()> {
        if let Some(mut row) = self.codes.iter_mut().find(|r| r.id == id) {
            if row.status == "used" {
                row.status = "unused".to_string();
                row.redeemed_by = None;
                row.redeemed_at = None;
            }
        }
        Ok(())
    }
}

/// In-memory habit repository for testing
#[derive(Default, Clone)]
pub struct MockHabitRepository {
    habits: Arc<DashMap<Uuid, HabitRow>>,
}

impl MockHabitRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `count` active habits for a user
    pub fn seed_active(&self, user_id: Uuid, count: usize) {
        for i in 0..count {
            let id = Uuid::new_v4();
            self.habits.insert(
                id,
                HabitRow {
                    id,
                    user_id,
                    name: format!("habit-{i}"),
                    archived: false,
                    created_at: Utc::now(),
                },
            );
        }
    }

    /// Mark one of a user's habits archived
    pub fn archive_one(&self, user_id: Uuid) {
        // Bind the id first so the iterator's shard lock is released
        // before get_mut takes a write lock on the same shard.
        let id = self
            .habits
            .iter()
            .find(|r| r.user_id == user_id && !r.archived)
            .map(|r| r.id);
        if let Some(id) = id {
            if let Some(mut habit) = self.habits.get_mut(&id) {
                habit.archived = true;
            }
        }
    }
}

#[async_trait]
impl HabitRepository for MockHabitRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<HabitRow>> {
        Ok(self.habits.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> DbResult<Vec<HabitRow>> {
        Ok(self
            .habits
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.value().clone())
            .collect())
    }

    async fn count_active_by_user(&self, user_id: Uuid) -> DbResult<i64> {
        Ok(self
            .habits
            .iter()
            .filter(|r| r.user_id == user_id && !r.archived)
            .count() as i64)
    }

    async fn create(&self, habit: CreateHabit) -> DbResult<HabitRow> {
        let row = HabitRow {
            id: habit.id,
            user_id: habit.user_id,
            name: habit.name,
            archived: false,
            created_at: Utc::now(),
        };
        self.habits.insert(habit.id, row.clone());
        Ok(row)
    }

    async fn archive(&self, id: Uuid) -> DbResult<()> {
        if let Some(mut habit) = self.habits.get_mut(&id) {
            habit.archived = true;
        }
        Ok(())
    }
}
