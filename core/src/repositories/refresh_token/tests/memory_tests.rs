//! Tests for the in-memory refresh token repository

use chrono::Duration;
use uuid::Uuid;

use crate::domain::entities::refresh_token::RefreshToken;
use crate::errors::{DomainError, TokenError};
use crate::repositories::refresh_token::{
    InMemoryRefreshTokenRepository, RefreshTokenRepository,
};

fn token(user_id: Uuid, hash: &str, lifetime: Duration) -> RefreshToken {
    RefreshToken::new(user_id, hash.to_string(), lifetime)
}

#[tokio::test]
async fn test_create_rejects_collision() {
    let repo = InMemoryRefreshTokenRepository::new();
    let user_id = Uuid::new_v4();

    repo.create(&token(user_id, "h1", Duration::days(7))).await.unwrap();
    let result = repo.create(&token(user_id, "h1", Duration::days(7))).await;

    assert!(matches!(result, Err(DomainError::Internal { .. })));
}

#[tokio::test]
async fn test_find_by_token_hides_expired_rows() {
    let repo = InMemoryRefreshTokenRepository::new();
    let user_id = Uuid::new_v4();
    repo.create(&token(user_id, "live", Duration::days(7))).await.unwrap();
    repo.create(&token(user_id, "stale", -Duration::minutes(1))).await.unwrap();

    assert!(repo.find_by_token("live").await.unwrap().is_some());
    assert!(repo.find_by_token("stale").await.unwrap().is_none());
    assert!(repo.find_any_by_token("stale").await.unwrap().is_some());
    assert_eq!(repo.find_by_user_id(user_id).await.unwrap().len(), 1);
    assert_eq!(repo.count_user_tokens(user_id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_delete_by_user_only_touches_that_user() {
    let repo = InMemoryRefreshTokenRepository::new();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    repo.create(&token(alice, "a1", Duration::days(7))).await.unwrap();
    repo.create(&token(alice, "a2", Duration::days(7))).await.unwrap();
    repo.create(&token(bob, "b1", Duration::days(7))).await.unwrap();

    assert_eq!(repo.delete_by_user_id(alice).await.unwrap(), 2);
    assert!(repo.find_by_token("b1").await.unwrap().is_some());
    assert_eq!(repo.len().await, 1);
}

#[tokio::test]
async fn test_delete_and_sweep() {
    let repo = InMemoryRefreshTokenRepository::new();
    let user_id = Uuid::new_v4();
    repo.create(&token(user_id, "keep", Duration::days(7))).await.unwrap();
    repo.create(&token(user_id, "old1", -Duration::hours(1))).await.unwrap();
    repo.create(&token(user_id, "old2", -Duration::days(1))).await.unwrap();

    assert_eq!(repo.delete_expired().await.unwrap(), 2);
    assert!(repo.delete("keep").await.unwrap());
    assert!(!repo.delete("keep").await.unwrap());
    assert!(repo.is_empty().await);
}

#[tokio::test]
async fn test_rotate_is_single_use() {
    let repo = InMemoryRefreshTokenRepository::new();
    let user_id = Uuid::new_v4();
    repo.create(&token(user_id, "old", Duration::days(7))).await.unwrap();

    let next = token(user_id, "new", Duration::days(7));
    repo.rotate("old", &next).await.unwrap();

    assert!(repo.find_by_token("old").await.unwrap().is_none());
    assert!(repo.find_by_token("new").await.unwrap().is_some());

    let again = repo.rotate("old", &token(user_id, "newer", Duration::days(7))).await;
    assert!(matches!(again, Err(DomainError::Token(TokenError::InvalidToken))));
    assert!(repo.find_by_token("newer").await.unwrap().is_none());
}

#[tokio::test]
async fn test_rotate_collision_keeps_old_row() {
    let repo = InMemoryRefreshTokenRepository::new();
    let user_id = Uuid::new_v4();
    repo.create(&token(user_id, "old", Duration::days(7))).await.unwrap();
    repo.create(&token(user_id, "taken", Duration::days(7))).await.unwrap();

    let result = repo.rotate("old", &token(user_id, "taken", Duration::days(7))).await;

    assert!(matches!(result, Err(DomainError::Internal { .. })));
    assert!(repo.find_by_token("old").await.unwrap().is_some());
}
