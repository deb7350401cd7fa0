use std::sync::Arc;

use chrono::{Duration, Utc};

use caa_core::domain::entities::signing_key::SigningAlgorithm;
use caa_core::errors::{DomainError, KeyError};
use caa_core::repositories::SigningKeyRepository;

use super::test_pool;
use crate::database::MySqlSigningKeyRepository;

#[tokio::test]
#[ignore] // Requires actual database
async fn test_activation_keeps_single_active_key() {
    let repo = Arc::new(MySqlSigningKeyRepository::new(test_pool().await));
    let expires_at = Utc::now() + Duration::days(1);

    let first = repo.create_key(2048, SigningAlgorithm::RS256, expires_at).await.unwrap();
    let second = repo.create_key(2048, SigningAlgorithm::RS256, expires_at).await.unwrap();

    let (a, b) = tokio::join!(
        repo.activate_key(&first.key_id),
        repo.activate_key(&second.key_id)
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(repo.count_active_keys().await.unwrap(), 1);
    assert!(repo.get_key_by_key_id(&first.key_id).await.is_ok());
    assert!(repo.get_key_by_key_id(&second.key_id).await.is_ok());
}

#[tokio::test]
#[ignore] // Requires actual database
async fn test_unknown_key_cannot_be_activated() {
    let repo = MySqlSigningKeyRepository::new(test_pool().await);

    let result = repo.activate_key("missing").await;
    assert!(matches!(
        result,
        Err(DomainError::Key(KeyError::KeyNotFound { .. }))
    ));
}

#[tokio::test]
#[ignore] // Requires actual database
async fn test_expired_key_cannot_be_activated() {
    let repo = MySqlSigningKeyRepository::new(test_pool().await);
    let stale = repo
        .create_key(2048, SigningAlgorithm::RS256, Utc::now() - Duration::minutes(1))
        .await
        .unwrap();

    assert!(matches!(
        repo.activate_key(&stale.key_id).await,
        Err(DomainError::Key(KeyError::KeyExpired { .. }))
    ));
}
