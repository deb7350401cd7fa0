//! Shared fixture for the HTTP tests: in-memory repositories behind the real services

#![allow(dead_code)]

use std::sync::Arc;

use actix_web::web;
use caa_api::AppState;
use caa_core::domain::entities::TokenPair;
use caa_core::repositories::{
    InMemoryRbacRepository, InMemoryRefreshTokenRepository, InMemorySigningKeyRepository,
    InMemoryUserRepository,
};
use caa_core::services::{
    AuthService, AuthServiceConfig, AuthorizationEngine, SigningKeyManager,
    SigningKeyManagerConfig, TokenService, TokenServiceConfig,
};
use uuid::Uuid;

pub type TestState = AppState<
    InMemoryUserRepository,
    InMemoryRefreshTokenRepository,
    InMemorySigningKeyRepository,
    InMemoryRbacRepository,
>;

pub struct TestContext {
    pub state: web::Data<TestState>,
    pub token_service: Arc<TokenService<InMemorySigningKeyRepository>>,
    pub engine: Arc<AuthorizationEngine<InMemoryRbacRepository>>,
}

impl TestContext {
    pub async fn new() -> Self {
        let key_manager = Arc::new(SigningKeyManager::new(
            Arc::new(InMemorySigningKeyRepository::new()),
            SigningKeyManagerConfig::default(),
        ));
        let token_service = Arc::new(TokenService::new(
            key_manager,
            TokenServiceConfig::default(),
        ));

        let engine = Arc::new(
            AuthorizationEngine::new(Arc::new(InMemoryRbacRepository::new()))
                .await
                .unwrap(),
        );
        engine.seed_defaults().await.unwrap();

        let auth_service = Arc::new(AuthService::with_authorization(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryRefreshTokenRepository::new()),
            Arc::clone(&token_service),
            Arc::clone(&engine),
            AuthServiceConfig {
                bcrypt_cost: 4,
                ..AuthServiceConfig::default()
            },
        ));

        Self {
            state: web::Data::new(AppState::new(auth_service, Arc::clone(&engine))),
            token_service,
            engine,
        }
    }

    /// Register through the service layer, bypassing HTTP
    pub async fn register(&self, username: &str) -> (Uuid, TokenPair) {
        let (user, tokens) = self
            .state
            .auth_service
            .register(username, "password123", "editor123")
            .await
            .unwrap();
        (user.id, tokens)
    }

    /// Register a user holding the admin role
    pub async fn register_admin(&self, username: &str) -> (Uuid, TokenPair) {
        let (user_id, tokens) = self.register(username).await;
        self.engine.assign_role(user_id, "admin").await.unwrap();
        (user_id, tokens)
    }
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}
