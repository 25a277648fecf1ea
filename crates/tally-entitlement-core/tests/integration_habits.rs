//! Habit-cap enforcement tests

mod common;

use std::sync::Arc;

use common::mock_repos::{MockAccountRepository, MockHabitRepository, MockRedeemCodeRepository};
use tally_entitlement_core::{AllowList, EntitlementConfig, EntitlementError, EntitlementService};
use tally_types::UserId;

type TestService =
    EntitlementService<MockAccountRepository, MockRedeemCodeRepository, MockHabitRepository>;

fn setup(config: EntitlementConfig) -> (TestService, MockAccountRepository, MockHabitRepository) {
    let accounts = MockAccountRepository::new();
    let habits = MockHabitRepository::new();
    let service = EntitlementService::new(
        Arc::new(accounts.clone()),
        Arc::new(MockRedeemCodeRepository::new()),
        Arc::new(habits.clone()),
        config,
    );
    (service, accounts, habits)
}

#[tokio::test]
async fn test_free_account_at_cap_is_blocked() {
    let (service, accounts, habits) = setup(EntitlementConfig::new("whsec_test", "lsq_test"));
    let account = MockAccountRepository::free_account("user@example.com");
    let user_id = UserId(account.id);
    accounts.insert_account(account);
    habits.seed_active(user_id.0, 5);

    let err = service.create_habit(&user_id, "read").await.unwrap_err();
    assert!(matches!(err, EntitlementError::UpgradeRequired { limit: 5 }));
    assert_eq!(service.list_habits(&user_id).await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_free_account_below_cap_may_create() {
    let (service, accounts, habits) = setup(EntitlementConfig::new("whsec_test", "lsq_test"));
    let account = MockAccountRepository::free_account("user@example.com");
    let user_id = UserId(account.id);
    accounts.insert_account(account);
    habits.seed_active(user_id.0, 4);

    let habit = service.create_habit(&user_id, "read").await.unwrap();
    assert_eq!(habit.name, "read");
    assert_eq!(service.list_habits(&user_id).await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_archived_habits_do_not_count() {
    let (service, accounts, habits) = setup(EntitlementConfig::new("whsec_test", "lsq_test"));
    let account = MockAccountRepository::free_account("user@example.com");
    let user_id = UserId(account.id);
    accounts.insert_account(account);
    habits.seed_active(user_id.0, 5);
    habits.archive_one(user_id.0);

    assert!(service.create_habit(&user_id, "read").await.is_ok());
}

#[tokio::test]
async fn test_pro_account_is_uncapped() {
    let (service, accounts, habits) = setup(EntitlementConfig::new("whsec_test", "lsq_test"));
    let mut account = MockAccountRepository::free_account("user@example.com");
    account.plan = "pro".to_string();
    let user_id = UserId(account.id);
    accounts.insert_account(account);
    habits.seed_active(user_id.0, 50);

    assert!(service.create_habit(&user_id, "read").await.is_ok());
}

#[tokio::test]
async fn test_allow_listed_account_is_exempt() {
    let config = EntitlementConfig::new("whsec_test", "lsq_test")
        .with_allow_list(AllowList::from_emails(["vip@trytally.app"]));
    let (service, accounts, habits) = setup(config);
    let account = MockAccountRepository::free_account("vip@trytally.app");
    let user_id = UserId(account.id);
    accounts.insert_account(account);
    habits.seed_active(user_id.0, 20);

    assert!(service.create_habit(&user_id, "read").await.is_ok());
}
