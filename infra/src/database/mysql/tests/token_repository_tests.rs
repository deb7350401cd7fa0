use chrono::Duration;
use uuid::Uuid;

use caa_core::domain::entities::refresh_token::RefreshToken;
use caa_core::errors::{DomainError, TokenError};
use caa_core::repositories::RefreshTokenRepository;

use super::test_pool;
use crate::database::MySqlRefreshTokenRepository;

fn token(user_id: Uuid, lifetime: Duration) -> RefreshToken {
    RefreshToken::new(user_id, Uuid::new_v4().simple().to_string(), lifetime)
}

#[tokio::test]
#[ignore] // Requires actual database
async fn test_rotate_consumes_old_token() {
    let repo = MySqlRefreshTokenRepository::new(test_pool().await);
    let user_id = Uuid::new_v4();
    let old = token(user_id, Duration::days(7));
    let new = token(user_id, Duration::days(7));
    repo.create(&old).await.unwrap();

    repo.rotate(&old.token_hash, &new).await.unwrap();

    assert!(repo.find_any_by_token(&old.token_hash).await.unwrap().is_none());
    assert!(repo.find_by_token(&new.token_hash).await.unwrap().is_some());
    assert!(matches!(
        repo.rotate(&old.token_hash, &token(user_id, Duration::days(7))).await,
        Err(DomainError::Token(TokenError::InvalidToken))
    ));
    assert_eq!(repo.delete_by_user_id(user_id).await.unwrap(), 1);
}

#[tokio::test]
#[ignore] // Requires actual database
async fn test_expired_tokens_hidden_and_swept() {
    let repo = MySqlRefreshTokenRepository::new(test_pool().await);
    let expired = token(Uuid::new_v4(), -Duration::minutes(1));
    repo.create(&expired).await.unwrap();

    assert!(repo.find_by_token(&expired.token_hash).await.unwrap().is_none());
    assert!(repo.find_any_by_token(&expired.token_hash).await.unwrap().is_some());
    assert!(repo.delete_expired().await.unwrap() >= 1);
    assert!(repo.find_any_by_token(&expired.token_hash).await.unwrap().is_none());
}
