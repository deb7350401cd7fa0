//! End-to-end flow across signing keys, tokens, authentication and RBAC

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use caa_core::errors::{DomainError, TokenError};
    use caa_core::repositories::{
        InMemoryRbacRepository, InMemoryRefreshTokenRepository, InMemorySigningKeyRepository,
        InMemoryUserRepository, SigningKeyRepository,
    };
    use caa_core::services::{
        AuthService, AuthServiceConfig, AuthorizationEngine, KeyRotationScheduler,
        SigningKeyManager, SigningKeyManagerConfig, TokenService, TokenServiceConfig,
    };

    #[tokio::test]
    async fn test_register_authorize_rotate_refresh() {
        let keys = Arc::new(InMemorySigningKeyRepository::new());
        let key_manager = Arc::new(SigningKeyManager::new(
            Arc::clone(&keys),
            SigningKeyManagerConfig::default(),
        ));
        let token_service = Arc::new(TokenService::new(
            Arc::clone(&key_manager),
            TokenServiceConfig::default(),
        ));
        let engine = Arc::new(
            AuthorizationEngine::new(Arc::new(InMemoryRbacRepository::new()))
                .await
                .unwrap(),
        );
        engine.seed_defaults().await.unwrap();

        let auth = AuthService::with_authorization(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryRefreshTokenRepository::new()),
            Arc::clone(&token_service),
            Arc::clone(&engine),
            AuthServiceConfig {
                bcrypt_cost: 4,
                ..AuthServiceConfig::default()
            },
        );

        let (user, pair) = auth.register("alice", "pass", "edit").await.unwrap();
        let claims = token_service
            .validate_access_token(&pair.access_token)
            .await
            .unwrap();
        let user_id = claims.user_id().unwrap();
        assert_eq!(user_id, user.id);

        assert!(engine.check_permission(user_id, "grids", "own").await.unwrap());
        assert!(!engine.check_permission(user_id, "users", "read").await.unwrap());

        key_manager.rotate().await.unwrap();
        assert_eq!(keys.count_active_keys().await.unwrap(), 1);
        assert!(token_service
            .validate_access_token(&pair.access_token)
            .await
            .is_ok());

        let refreshed = auth.refresh_token(&pair.refresh_token).await.unwrap();
        assert!(token_service
            .validate_access_token(&refreshed.access_token)
            .await
            .is_ok());
        assert!(matches!(
            auth.refresh_token(&pair.refresh_token).await,
            Err(DomainError::Token(TokenError::InvalidToken))
        ));
    }

    #[tokio::test]
    async fn test_scheduler_lifecycle() {
        let manager = Arc::new(SigningKeyManager::new(
            Arc::new(InMemorySigningKeyRepository::new()),
            SigningKeyManagerConfig {
                rotation_period: Duration::from_secs(3600),
                ..SigningKeyManagerConfig::default()
            },
        ));
        let scheduler = KeyRotationScheduler::new(Arc::clone(&manager));

        scheduler.start().await.unwrap();
        assert!(scheduler.is_running().await);
        assert!(scheduler.start().await.is_err());

        let active = manager.repository().get_active_key().await.unwrap();
        assert!(active.is_valid_for_signing());

        scheduler.stop().await;
        assert!(!scheduler.is_running().await);
        scheduler.stop().await;
    }
}
