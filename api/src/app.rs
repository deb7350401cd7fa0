//! Application factory
//!
//! Registers the shared state, the object-safe views used by the
//! middleware, and all routes.

use std::sync::Arc;

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    http::StatusCode,
    web, App, Error,
};
use caa_core::repositories::{
    RbacRepository, RefreshTokenRepository, SigningKeyRepository, UserRepository,
};
use caa_shared::{error_codes, Environment};
use tracing_actix_web::TracingLogger;

use crate::handlers::error::ApiError;
use crate::handlers::health::{health_check, not_found};
use crate::middleware::{create_cors, AccessTokenVerifier, PermissionChecker};
use crate::routes::{self, AppState};

/// Create and configure the application with all dependencies
pub fn create_app<U, R, K, B>(
    app_state: web::Data<AppState<U, R, K, B>>,
    environment: Environment,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
>
where
    U: UserRepository + 'static,
    R: RefreshTokenRepository + 'static,
    K: SigningKeyRepository + 'static,
    B: RbacRepository + 'static,
{
    let verifier: Arc<dyn AccessTokenVerifier> = app_state.auth_service.token_service().clone();
    let checker: Arc<dyn PermissionChecker> = app_state.authorization.clone();

    App::new()
        .app_data(app_state)
        .app_data(web::Data::from(verifier))
        .app_data(web::Data::from(checker))
        .app_data(json_config())
        .app_data(query_config())
        .wrap(create_cors(environment))
        .wrap(TracingLogger::default())
        .route("/health", web::get().to(health_check))
        .service(web::scope("/api/v1").configure(routes::configure::<U, R, K, B>))
        .default_service(web::route().to(not_found))
}

/// Malformed JSON bodies answer with the standard error body
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            error_codes::VALIDATION_ERROR,
            err.to_string(),
        )
        .into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            error_codes::VALIDATION_ERROR,
            err.to_string(),
        )
        .into()
    })
}
