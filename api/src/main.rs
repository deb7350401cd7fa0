use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, HttpServer};
use anyhow::Context;
use tracing::info;

use caa_api::{create_app, telemetry, AppState};
use caa_core::services::{
    AuthService, AuthServiceConfig, AuthorizationEngine, KeyRotationScheduler,
    RefreshTokenCleanupService, SigningKeyManager, SigningKeyManagerConfig, TokenService,
    TokenServiceConfig,
};
use caa_infra::database::{
    DatabasePool, MySqlRbacRepository, MySqlRefreshTokenRepository, MySqlSigningKeyRepository,
    MySqlUserRepository,
};
use caa_shared::AppConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    telemetry::init_tracing(&config.logging);

    info!(environment = %config.environment, "Starting CAA API server");

    let database = DatabasePool::new(&config.database)
        .await
        .context("failed to connect to the database")?;
    database
        .run_migrations()
        .await
        .context("failed to run database migrations")?;
    let pool = database.get_pool().clone();

    let users = Arc::new(MySqlUserRepository::new(pool.clone()));
    let refresh_tokens = Arc::new(MySqlRefreshTokenRepository::new(pool.clone()));
    let signing_keys = Arc::new(MySqlSigningKeyRepository::new(pool.clone()));
    let rbac = Arc::new(MySqlRbacRepository::new(pool));

    let key_manager = Arc::new(SigningKeyManager::new(
        signing_keys,
        SigningKeyManagerConfig::from_shared(&config.auth.signing_keys)?,
    ));
    let scheduler = KeyRotationScheduler::new(Arc::clone(&key_manager));
    scheduler
        .start()
        .await
        .context("failed to start key rotation")?;

    let token_service = Arc::new(TokenService::new(
        key_manager,
        TokenServiceConfig::from_shared(&config.auth)?,
    ));

    let authorization = Arc::new(AuthorizationEngine::new(rbac).await?);
    authorization
        .seed_defaults()
        .await
        .context("failed to seed default roles")?;

    let auth_service = Arc::new(AuthService::with_authorization(
        users,
        Arc::clone(&refresh_tokens),
        token_service,
        Arc::clone(&authorization),
        AuthServiceConfig::from_shared(&config.auth),
    ));

    let cleanup = Arc::new(RefreshTokenCleanupService::new(
        refresh_tokens,
        Duration::from_secs(config.auth.tokens.cleanup_interval_minutes * 60),
    ));
    cleanup.start().await?;

    let app_state = web::Data::new(AppState::new(auth_service, authorization));
    let environment = config.environment;
    let bind_address = config.server.bind_address();
    info!(address = %bind_address, "Server listening");

    let server_result = HttpServer::new(move || create_app(app_state.clone(), environment))
        .bind(&bind_address)
        .with_context(|| format!("failed to bind {}", bind_address))?
        .run()
        .await;

    info!("Shutting down background tasks");
    scheduler.stop().await;
    cleanup.stop().await;
    database.close().await;

    server_result.context("HTTP server failed")
}
