/// Integration tests for refresh-token rotation and revocation
///
/// These tests require a running PostgreSQL database (see tests/common).

mod common;

use chrono::Duration;
use famsync_shared::models::refresh_token::RefreshToken;

#[tokio::test]
async fn test_issue_and_consume() {
    let pool = require_db!();
    let user = common::create_test_user(&pool).await;

    let issued = RefreshToken::issue(&pool, user.id, Duration::days(7))
        .await
        .expect("Issue should succeed");

    assert_eq!(issued.user_id, user.id);
    assert!(!issued.is_revoked);
    assert!(!issued.is_expired());

    let consumed = RefreshToken::consume(&pool, &issued.token)
        .await
        .expect("Consume should succeed")
        .expect("Live token should be consumable");

    assert_eq!(consumed.id, issued.id);
    assert!(consumed.is_revoked);
}

#[tokio::test]
async fn test_consumed_token_cannot_be_replayed() {
    let pool = require_db!();
    let user = common::create_test_user(&pool).await;

    let issued = RefreshToken::issue(&pool, user.id, Duration::days(7))
        .await
        .expect("Issue should succeed");

    // First rotation wins
    assert!(RefreshToken::consume(&pool, &issued.token)
        .await
        .expect("Consume should succeed")
        .is_some());

    // Replay of the same token must observe the revoked flag and fail
    assert!(RefreshToken::consume(&pool, &issued.token)
        .await
        .expect("Consume should succeed")
        .is_none());
}

#[tokio::test]
async fn test_expired_token_cannot_be_consumed() {
    let pool = require_db!();
    let user = common::create_test_user(&pool).await;

    let issued = RefreshToken::issue(&pool, user.id, Duration::seconds(-60))
        .await
        .expect("Issue should succeed");

    assert!(issued.is_expired());
    assert!(RefreshToken::consume(&pool, &issued.token)
        .await
        .expect("Consume should succeed")
        .is_none());
}

#[tokio::test]
async fn test_unknown_token_cannot_be_consumed() {
    let pool = require_db!();

    let result = RefreshToken::consume(&pool, "no-such-token")
        .await
        .expect("Consume should succeed");
    assert!(result.is_none());
}

#[tokio::test]
async fn test_revoke_is_idempotent() {
    let pool = require_db!();
    let user = common::create_test_user(&pool).await;

    let issued = RefreshToken::issue(&pool, user.id, Duration::days(7))
        .await
        .expect("Issue should succeed");

    // First revoke flips the row, second finds nothing to flip; neither errors
    assert!(RefreshToken::revoke(&pool, &issued.token).await.unwrap());
    assert!(!RefreshToken::revoke(&pool, &issued.token).await.unwrap());

    // Revoking an unknown token is also fine
    assert!(!RefreshToken::revoke(&pool, "no-such-token").await.unwrap());
}

#[tokio::test]
async fn test_revoke_all_for_user() {
    let pool = require_db!();
    let user = common::create_test_user(&pool).await;

    for _ in 0..3 {
        RefreshToken::issue(&pool, user.id, Duration::days(7))
            .await
            .expect("Issue should succeed");
    }

    let revoked = RefreshToken::revoke_all_for_user(&pool, user.id)
        .await
        .expect("Revoke all should succeed");
    assert_eq!(revoked, 3);

    let again = RefreshToken::revoke_all_for_user(&pool, user.id)
        .await
        .expect("Revoke all should succeed");
    assert_eq!(again, 0);
}

#[tokio::test]
async fn test_concurrent_consume_single_winner() {
    let pool = require_db!();
    let user = common::create_test_user(&pool).await;

    let issued = RefreshToken::issue(&pool, user.id, Duration::days(7))
        .await
        .expect("Issue should succeed");

    // Race two rotations of the same token; the compare-and-set must let
    // exactly one through
    let (a, b) = tokio::join!(
        RefreshToken::consume(&pool, &issued.token),
        RefreshToken::consume(&pool, &issued.token),
    );

    let winners = [a.unwrap(), b.unwrap()]
        .into_iter()
        .flatten()
        .count();
    assert_eq!(winners, 1);
}
