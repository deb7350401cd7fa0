//! Unit tests for authentication service

use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::domain::entities::user::UserStatus;
use crate::errors::{AuthError, DomainError, TokenError};
use crate::repositories::{
    InMemoryRbacRepository, InMemoryRefreshTokenRepository, InMemorySigningKeyRepository,
    InMemoryUserRepository, RefreshTokenRepository, UserRepository,
};
use crate::services::auth::{AuthService, AuthServiceConfig};
use crate::services::rbac::AuthorizationEngine;
use crate::services::signing_key::{SigningKeyManager, SigningKeyManagerConfig};
use crate::services::token::{hash_refresh_secret, TokenService, TokenServiceConfig};

type TestAuthService = AuthService<
    InMemoryUserRepository,
    InMemoryRefreshTokenRepository,
    InMemorySigningKeyRepository,
    InMemoryRbacRepository,
>;

struct Fixture {
    service: TestAuthService,
    users: Arc<InMemoryUserRepository>,
    refresh_tokens: Arc<InMemoryRefreshTokenRepository>,
    engine: Arc<AuthorizationEngine<InMemoryRbacRepository>>,
}

fn test_config() -> AuthServiceConfig {
    AuthServiceConfig {
        bcrypt_cost: 4,
        ..AuthServiceConfig::default()
    }
}

async fn create_fixture(token_config: TokenServiceConfig) -> Fixture {
    create_fixture_with(token_config, test_config()).await
}

async fn create_fixture_with(
    token_config: TokenServiceConfig,
    auth_config: AuthServiceConfig,
) -> Fixture {
    let users = Arc::new(InMemoryUserRepository::new());
    let refresh_tokens = Arc::new(InMemoryRefreshTokenRepository::new());
    let key_manager = Arc::new(SigningKeyManager::new(
        Arc::new(InMemorySigningKeyRepository::new()),
        SigningKeyManagerConfig::default(),
    ));
    let token_service = Arc::new(TokenService::new(key_manager, token_config));

    let engine = Arc::new(
        AuthorizationEngine::new(Arc::new(InMemoryRbacRepository::new()))
            .await
            .unwrap(),
    );
    engine.seed_defaults().await.unwrap();

    let service = AuthService::with_authorization(
        Arc::clone(&users),
        Arc::clone(&refresh_tokens),
        token_service,
        Arc::clone(&engine),
        auth_config,
    );

    Fixture {
        service,
        users,
        refresh_tokens,
        engine,
    }
}

async fn default_fixture() -> Fixture {
    create_fixture(TokenServiceConfig::default()).await
}

fn assert_auth_error<T: std::fmt::Debug>(result: Result<T, DomainError>, expected: AuthError) {
    match result {
        Err(DomainError::Auth(actual)) => assert_eq!(actual, expected),
        other => panic!("expected {:?}, got {:?}", expected, other),
    }
}

fn assert_token_error<T: std::fmt::Debug>(result: Result<T, DomainError>, expected: TokenError) {
    match result {
        Err(DomainError::Token(actual)) => assert_eq!(actual, expected),
        other => panic!("expected {:?}, got {:?}", expected, other),
    }
}

#[tokio::test]
async fn test_register_creates_pending_user_with_session() {
    let fx = default_fixture().await;

    let (user, tokens) = fx
        .service
        .register("alice", "login-secret", "editor-secret")
        .await
        .unwrap();

    assert_eq!(user.username, "alice");
    assert_eq!(user.status, UserStatus::PendingSetup);
    assert!(user.password_hash.starts_with("$2"));
    assert_ne!(user.password_hash, user.editor_password_hash);

    let claims = fx
        .service
        .token_service()
        .validate_access_token(&tokens.access_token)
        .await
        .unwrap();
    assert_eq!(claims.user_id().unwrap(), user.id);

    let stored = fx
        .refresh_tokens
        .find_by_token(&hash_refresh_secret(&tokens.refresh_token))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.user_id, user.id);

    assert!(fx.engine.has_role(user.id, "user").await.unwrap());
}

#[tokio::test]
async fn test_register_rejects_taken_username() {
    let fx = default_fixture().await;
    fx.service.register("alice", "a-pass", "e-pass").await.unwrap();

    assert_auth_error(
        fx.service.register(" alice ", "other", "other").await,
        AuthError::UserAlreadyExists,
    );
}

#[tokio::test]
async fn test_register_validates_input() {
    let fx = default_fixture().await;

    for (username, password, editor_password) in [
        ("", "pass", "edit"),
        ("ab", "pass", "edit"),
        ("has space", "pass", "edit"),
        ("alice", "", "edit"),
        ("alice", "pass", ""),
    ] {
        assert!(matches!(
            fx.service.register(username, password, editor_password).await,
            Err(DomainError::Validation { .. })
        ));
    }

    let long = "x".repeat(73);
    assert!(matches!(
        fx.service.register("alice", &long, "edit").await,
        Err(DomainError::Validation { .. })
    ));
    assert!(!fx.users.exists_by_username("alice").await.unwrap());
}

#[tokio::test]
async fn test_register_without_default_role_still_succeeds() {
    let fx = default_fixture().await;
    let missing_role = AuthService::with_authorization(
        Arc::clone(&fx.users),
        Arc::clone(&fx.refresh_tokens),
        Arc::clone(fx.service.token_service()),
        Arc::clone(&fx.engine),
        AuthServiceConfig {
            default_role: Some("ghost".to_string()),
            ..test_config()
        },
    );

    let (user, _) = missing_role.register("bob", "pass", "edit").await.unwrap();

    assert!(fx.engine.get_user_roles(user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_register_without_engine() {
    let fx = default_fixture().await;
    let plain: AuthService<_, _, _> = AuthService::new(
        Arc::clone(&fx.users),
        Arc::clone(&fx.refresh_tokens),
        Arc::clone(fx.service.token_service()),
        test_config(),
    );

    let (user, _) = plain.register("carol", "pass", "edit").await.unwrap();
    assert_eq!(fx.users.find_by_id(user.id).await.unwrap().unwrap().username, "carol");
}

#[tokio::test]
async fn test_login_success() {
    let fx = default_fixture().await;
    let (registered, _) = fx.service.register("alice", "pass", "edit").await.unwrap();

    let (user, tokens) = fx.service.login("alice", "pass").await.unwrap();

    assert_eq!(user.id, registered.id);
    assert_eq!(fx.refresh_tokens.count_user_tokens(user.id).await.unwrap(), 2);
    assert!(fx
        .service
        .token_service()
        .validate_access_token(&tokens.access_token)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let fx = default_fixture().await;
    let (mut user, _) = fx.service.register("alice", "pass", "edit").await.unwrap();

    assert_auth_error(
        fx.service.login("alice", "wrong").await,
        AuthError::InvalidCredentials,
    );
    assert_auth_error(
        fx.service.login("nobody", "pass").await,
        AuthError::InvalidCredentials,
    );
    // the editor password is not a login password
    assert_auth_error(
        fx.service.login("alice", "edit").await,
        AuthError::InvalidCredentials,
    );

    user.deactivate();
    fx.users.update(user).await;
    assert_auth_error(
        fx.service.login("alice", "pass").await,
        AuthError::InvalidCredentials,
    );
}

#[tokio::test]
async fn test_unknown_username_costs_a_password_check() {
    let fx = create_fixture_with(
        TokenServiceConfig::default(),
        AuthServiceConfig {
            bcrypt_cost: 8,
            ..AuthServiceConfig::default()
        },
    )
    .await;
    fx.service.register("alice", "pass", "edit").await.unwrap();
    // first failed lookup also builds the placeholder hash
    let _ = fx.service.login("nobody", "pass").await;

    let started = Instant::now();
    let _ = fx.service.login("alice", "wrong").await;
    let wrong_password = started.elapsed();

    let started = Instant::now();
    assert_auth_error(
        fx.service.login("nobody", "pass").await,
        AuthError::InvalidCredentials,
    );
    let unknown_user = started.elapsed();

    assert!(
        unknown_user * 4 >= wrong_password,
        "unknown user took {:?}, wrong password took {:?}",
        unknown_user,
        wrong_password
    );
}

#[tokio::test]
async fn test_refresh_token_is_single_use() {
    let fx = default_fixture().await;
    let (user, first) = fx.service.register("alice", "pass", "edit").await.unwrap();

    let second = fx.service.refresh_token(&first.refresh_token).await.unwrap();

    assert_ne!(second.refresh_token, first.refresh_token);
    assert_token_error(
        fx.service.refresh_token(&first.refresh_token).await,
        TokenError::InvalidToken,
    );
    assert_eq!(fx.refresh_tokens.count_user_tokens(user.id).await.unwrap(), 1);

    assert!(fx.service.refresh_token(&second.refresh_token).await.is_ok());
}

#[tokio::test]
async fn test_expired_refresh_token_is_deleted() {
    let fx = create_fixture(TokenServiceConfig {
        refresh_token_expiry_days: -1,
        ..TokenServiceConfig::default()
    })
    .await;
    let (_, tokens) = fx.service.register("alice", "pass", "edit").await.unwrap();

    assert_token_error(
        fx.service.refresh_token(&tokens.refresh_token).await,
        TokenError::TokenExpired,
    );
    assert!(fx.refresh_tokens.is_empty().await);
    assert_token_error(
        fx.service.refresh_token(&tokens.refresh_token).await,
        TokenError::InvalidToken,
    );
}

#[tokio::test]
async fn test_refresh_for_deactivated_user_is_rejected() {
    let fx = default_fixture().await;
    let (mut user, tokens) = fx.service.register("alice", "pass", "edit").await.unwrap();
    user.deactivate();
    fx.users.update(user).await;

    assert_token_error(
        fx.service.refresh_token(&tokens.refresh_token).await,
        TokenError::InvalidToken,
    );
    assert!(fx.refresh_tokens.is_empty().await);
}

#[tokio::test]
async fn test_revoke_refresh_token() {
    let fx = default_fixture().await;
    let (_, tokens) = fx.service.register("alice", "pass", "edit").await.unwrap();

    fx.service
        .revoke_refresh_token(&tokens.refresh_token)
        .await
        .unwrap();

    assert_token_error(
        fx.service.revoke_refresh_token(&tokens.refresh_token).await,
        TokenError::InvalidToken,
    );
    assert_token_error(
        fx.service.refresh_token(&tokens.refresh_token).await,
        TokenError::InvalidToken,
    );
}

#[tokio::test]
async fn test_logout_ends_every_session() {
    let fx = default_fixture().await;
    let (user, first) = fx.service.register("alice", "pass", "edit").await.unwrap();
    let (_, second) = fx.service.login("alice", "pass").await.unwrap();
    let (other, _) = fx.service.register("bob", "pass", "edit").await.unwrap();

    assert_eq!(fx.service.logout(user.id).await.unwrap(), 2);
    assert_eq!(fx.service.logout(user.id).await.unwrap(), 0);

    for secret in [&first.refresh_token, &second.refresh_token] {
        assert_token_error(
            fx.service.refresh_token(secret).await,
            TokenError::InvalidToken,
        );
    }
    assert_eq!(fx.refresh_tokens.count_user_tokens(other.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_validate_editor_password() {
    let fx = default_fixture().await;
    let (user, _) = fx.service.register("alice", "pass", "edit").await.unwrap();

    assert!(fx.service.validate_editor_password(user.id, "edit").await.unwrap());
    assert!(!fx.service.validate_editor_password(user.id, "pass").await.unwrap());
    assert!(!fx
        .service
        .validate_editor_password(Uuid::new_v4(), "edit")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_get_current_user() {
    let fx = default_fixture().await;
    let (user, _) = fx.service.register("alice", "pass", "edit").await.unwrap();

    assert_eq!(fx.service.get_current_user(user.id).await.unwrap().id, user.id);
    assert_auth_error(
        fx.service.get_current_user(Uuid::new_v4()).await,
        AuthError::UserNotFound,
    );
}

#[tokio::test]
async fn test_expired_access_token_recovered_by_refresh() {
    let fx = create_fixture(TokenServiceConfig {
        access_token_expiry_minutes: -1,
        ..TokenServiceConfig::default()
    })
    .await;
    let tokens = fx.service.token_service();

    let (user, pair) = fx.service.register("alice", "pass", "edit").await.unwrap();
    assert_token_error(
        tokens.validate_access_token(&pair.access_token).await,
        TokenError::TokenExpired,
    );

    let refreshed = fx.service.refresh_token(&pair.refresh_token).await.unwrap();
    assert_ne!(refreshed.refresh_token, pair.refresh_token);
    assert_eq!(
        fx.refresh_tokens
            .find_by_token(&hash_refresh_secret(&refreshed.refresh_token))
            .await
            .unwrap()
            .unwrap()
            .user_id,
        user.id
    );
}
