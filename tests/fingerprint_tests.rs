//! Integration tests for the fingerprint guard.

mod common;

use common::setup;
use dropbin::error::AppError;
use dropbin::services::fingerprint::{FingerprintService, GuardOutcome};

#[tokio::test]
async fn first_seen_fingerprint_is_allowed_and_registered() {
    let env = setup().await;

    let outcome = FingerprintService::check(&env.db, "fp1")
        .await
        .expect("Check failed");
    assert_eq!(outcome, GuardOutcome::Allowed);

    let entries = FingerprintService::list(&env.db).await.expect("List failed");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].fingerprint, "fp1");
    assert!(!entries[0].is_blocked);
    assert!(entries[0].name.is_none());
}

#[tokio::test]
async fn repeated_check_performs_no_additional_writes() {
    let env = setup().await;

    FingerprintService::check(&env.db, "fp1").await.expect("Check failed");
    let outcome = FingerprintService::check(&env.db, "fp1")
        .await
        .expect("Second check failed");
    assert_eq!(outcome, GuardOutcome::Allowed);

    let entries = FingerprintService::list(&env.db).await.expect("List failed");
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn toggle_block_on_unseen_fingerprint_is_not_found() {
    let env = setup().await;

    let err = FingerprintService::toggle_block(&env.db, "never-seen")
        .await
        .expect_err("Toggle should fail for unseen fingerprint");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn toggle_block_is_its_own_inverse() {
    let env = setup().await;

    FingerprintService::check(&env.db, "fp1").await.expect("Check failed");

    let blocked = FingerprintService::toggle_block(&env.db, "fp1")
        .await
        .expect("Toggle failed");
    assert!(blocked.is_blocked);

    let outcome = FingerprintService::check(&env.db, "fp1")
        .await
        .expect("Check failed");
    assert_eq!(outcome, GuardOutcome::Blocked);

    let unblocked = FingerprintService::toggle_block(&env.db, "fp1")
        .await
        .expect("Second toggle failed");
    assert!(!unblocked.is_blocked);

    let outcome = FingerprintService::check(&env.db, "fp1")
        .await
        .expect("Check failed");
    assert_eq!(outcome, GuardOutcome::Allowed);
}
