//! JWT authentication middleware for protecting API endpoints.
//!
//! The middleware reads the access token from the `Authorization: Bearer`
//! header, falling back to a `token` query parameter, verifies it against
//! the signing keys, and injects an [`AuthContext`] into the request.
//!
//! Verification goes through an [`AccessTokenVerifier`] registered as
//! `web::Data<dyn AccessTokenVerifier>`, so protected routes do not carry
//! the repository type parameters of the token service.

use std::{
    future::{ready, Ready},
    rc::Rc,
    task::{Context, Poll},
};

use actix_web::{
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web, Error, FromRequest, HttpMessage, HttpRequest,
};
use async_trait::async_trait;
use caa_core::{
    domain::entities::Claims,
    errors::{DomainError, TokenError},
    repositories::SigningKeyRepository,
    services::{extract_token, TokenService},
};
use futures_util::future::LocalBoxFuture;
use serde::Deserialize;
use uuid::Uuid;

use crate::handlers::error::ApiError;

/// Authenticated caller injected into request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: Uuid,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims) -> Result<Self, DomainError> {
        let user_id = claims.user_id().map_err(|_| TokenError::InvalidToken)?;
        Ok(Self { user_id })
    }
}

/// Object-safe view of the token service used by the middleware
#[async_trait]
pub trait AccessTokenVerifier: Send + Sync {
    async fn verify_access_token(&self, token: &str) -> Result<Claims, DomainError>;
}

#[async_trait]
impl<K: SigningKeyRepository + 'static> AccessTokenVerifier for TokenService<K> {
    async fn verify_access_token(&self, token: &str) -> Result<Claims, DomainError> {
        self.validate_access_token(token).await
    }
}

/// JWT authentication middleware factory
#[derive(Debug, Clone, Default)]
pub struct JwtAuth;

impl JwtAuth {
    pub fn new() -> Self {
        Self
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

/// JWT authentication middleware service
pub struct JwtAuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            match authenticate(&req).await {
                Ok(context) => {
                    req.extensions_mut().insert(context);
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                Err(error) => Ok(req.error_response(error).map_into_right_body()),
            }
        })
    }
}

async fn authenticate(req: &ServiceRequest) -> Result<AuthContext, ApiError> {
    let Some(verifier) = req.app_data::<web::Data<dyn AccessTokenVerifier>>() else {
        tracing::error!("No access token verifier registered");
        return Err(ApiError::internal());
    };

    let token = request_token(req).map_err(ApiError::unauthenticated)?;
    let claims = verifier
        .verify_access_token(&token)
        .await
        .map_err(ApiError::unauthenticated)?;
    AuthContext::from_claims(&claims).map_err(ApiError::unauthenticated)
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Bearer header first, then the `token` query parameter
fn request_token(req: &ServiceRequest) -> Result<String, DomainError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let query = web::Query::<TokenQuery>::from_query(req.query_string())
        .ok()
        .and_then(|query| query.into_inner().token);

    extract_token(header, query.as_deref())
}

/// Extractor for handlers behind [`JwtAuth`]
impl FromRequest for AuthContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let result = req
            .extensions()
            .get::<AuthContext>()
            .copied()
            .ok_or_else(|| ApiError::unauthorized("Authentication required").into());

        ready(result)
    }
}
