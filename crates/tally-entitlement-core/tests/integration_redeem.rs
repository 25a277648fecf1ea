//! Code redemption integration tests
//!
//! Exercises the burn-on-use contract against the in-memory repositories:
//! exactly one success per code, stable error kinds for everything else.

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};

use common::mock_repos::{MockAccountRepository, MockHabitRepository, MockRedeemCodeRepository};
use tally_entitlement_core::{EntitlementConfig, EntitlementError, EntitlementService};
use tally_types::{ActivationErrorKind, UserId};

type TestService =
    EntitlementService<MockAccountRepository, MockRedeemCodeRepository, MockHabitRepository>;

fn setup() -> (TestService, MockAccountRepository, MockRedeemCodeRepository) {
    let accounts = MockAccountRepository::new();
    let codes = MockRedeemCodeRepository::new();
    let habits = MockHabitRepository::new();
    let service = EntitlementService::new(
        Arc::new(accounts.clone()),
        Arc::new(codes.clone()),
        Arc::new(habits),
        EntitlementConfig::new("whsec_test", "lsq_test"),
    );
    (service, accounts, codes)
}

#[tokio::test]
async fn test_successful_redemption_grants_permanent_pro() {
    let (service, accounts, codes) = setup();
    let account = MockAccountRepository::free_account("user@example.com");
    let user_id = UserId(account.id);
    accounts.insert_account(account);
    codes.insert_unused("ABC123", None);

    service.redeem_code("ABC123", &user_id).await.unwrap();

    let stored = accounts.get(user_id.0).unwrap();
    assert_eq!(stored.plan, "pro");
    assert_eq!(stored.pro_expires_at, None);

    let status = service.resolve(&user_id).await.unwrap();
    assert!(status.is_pro);
}

#[tokio::test]
async fn test_second_redemption_reports_already_used() {
    let (service, accounts, codes) = setup();
    let winner = MockAccountRepository::free_account("a@example.com");
    let loser = MockAccountRepository::free_account("b@example.com");
    let winner_id = UserId(winner.id);
    let loser_id = UserId(loser.id);
    accounts.insert_account(winner);
    accounts.insert_account(loser);
    codes.insert_unused("ABC123", None);

    service.redeem_code("ABC123", &winner_id).await.unwrap();

    let err = service.redeem_code("ABC123", &loser_id).await.unwrap_err();
    assert_eq!(
        err.activation_kind(),
        Some(ActivationErrorKind::CodeAlreadyUsed)
    );

    // The losing caller's plan is untouched
    assert_eq!(accounts.get(loser_id.0).unwrap().plan, "free");
}

#[tokio::test]
async fn test_unknown_code_reports_not_found() {
    let (service, accounts, _codes) = setup();
    let account = MockAccountRepository::free_account("user@example.com");
    let user_id = UserId(account.id);
    accounts.insert_account(account);

    let err = service.redeem_code("NOPE", &user_id).await.unwrap_err();
    assert_eq!(err.activation_kind(), Some(ActivationErrorKind::CodeNotFound));
}

#[tokio::test]
async fn test_expired_code_reports_expired() {
    let (service, accounts, codes) = setup();
    let account = MockAccountRepository::free_account("user@example.com");
    let user_id = UserId(account.id);
    accounts.insert_account(account);
    codes.insert_unused("OLD", Some(Utc::now() - Duration::days(1)));

    let err = service.redeem_code("OLD", &user_id).await.unwrap_err();
    assert_eq!(err.activation_kind(), Some(ActivationErrorKind::CodeExpired));
    assert_eq!(accounts.get(user_id.0).unwrap().plan, "free");
}

#[tokio::test]
async fn test_missing_account_is_not_an_activation_rejection() {
    let (service, _accounts, codes) = setup();
    codes.insert_unused("ABC123", None);

    let err = service
        .redeem_code("ABC123", &UserId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EntitlementError::AccountNotFound));
    assert!(err.activation_kind().is_none());
}

#[tokio::test]
async fn test_failed_plan_write_releases_the_code() {
    let (service, accounts, codes) = setup();
    let account = MockAccountRepository::free_account("user@example.com");
    let user_id = UserId(account.id);
    accounts.insert_account(account);
    codes.insert_unused("ABC123", None);

    // The burn succeeds but the plan write fails; the code must come back
    // so a retry is not stuck on code_already_used.
    accounts.fail_plan_writes(true);
    let err = service.redeem_code("ABC123", &user_id).await.unwrap_err();
    assert!(matches!(err, EntitlementError::Database(_)));
    assert!(err.activation_kind().is_none());
    assert_eq!(codes.get("ABC123").unwrap().status, "unused");
    assert_eq!(accounts.get(user_id.0).unwrap().plan, "free");

    // Retry after the outage: the same code redeems cleanly
    accounts.fail_plan_writes(false);
    service.redeem_code("ABC123", &user_id).await.unwrap();
    assert_eq!(codes.get("ABC123").unwrap().status, "used");
    assert_eq!(accounts.get(user_id.0).unwrap().plan, "pro");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_redemption_has_exactly_one_winner() {
    let (service, accounts, codes) = setup();
    let service = Arc::new(service);
    codes.insert_unused("RACE42", None);

    let mut user_ids = Vec::new();
    for i in 0..8 {
        let account = MockAccountRepository::free_account(&format!("u{i}@example.com"));
        user_ids.push(UserId(account.id));
        accounts.insert_account(account);
    }

    let mut handles = Vec::new();
    for user_id in user_ids {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service.redeem_code("RACE42", &user_id).await
        }));
    }

    let mut successes = 0;
    let mut already_used = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => successes += 1,
            Err(e) => {
                assert_eq!(
                    e.activation_kind(),
                    Some(ActivationErrorKind::CodeAlreadyUsed)
                );
                already_used += 1;
            }
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(already_used, 7);
}
