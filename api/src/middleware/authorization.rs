//! Route guards backed by the authorization engine.
//!
//! Both guards must run inside [`JwtAuth`](super::auth::JwtAuth): a request
//! without an [`AuthContext`] is rejected with 401. Denials are a generic 403
//! that does not name the missing permission or role.

use std::{
    future::{ready, Ready},
    rc::Rc,
    sync::Arc,
    task::{Context, Poll},
};

use actix_web::{
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use async_trait::async_trait;
use caa_core::{errors::DomainError, repositories::RbacRepository, services::AuthorizationEngine};
use futures_util::future::LocalBoxFuture;
use uuid::Uuid;

use super::auth::AuthContext;
use crate::handlers::error::ApiError;

/// Object-safe view of the authorization engine used by the guards
#[async_trait]
pub trait PermissionChecker: Send + Sync {
    async fn check_permission(
        &self,
        user_id: Uuid,
        resource: &str,
        action: &str,
    ) -> Result<bool, DomainError>;

    async fn has_any_role(&self, user_id: Uuid, roles: &[String]) -> Result<bool, DomainError>;
}

#[async_trait]
impl<R: RbacRepository + 'static> PermissionChecker for AuthorizationEngine<R> {
    async fn check_permission(
        &self,
        user_id: Uuid,
        resource: &str,
        action: &str,
    ) -> Result<bool, DomainError> {
        AuthorizationEngine::check_permission(self, user_id, resource, action).await
    }

    async fn has_any_role(&self, user_id: Uuid, roles: &[String]) -> Result<bool, DomainError> {
        for role in roles {
            if self.has_role(user_id, role).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// What a guard demands of the caller
#[derive(Debug, Clone)]
enum Requirement {
    Permission { resource: String, action: String },
    AnyRole(Vec<String>),
}

impl Requirement {
    async fn is_met(
        &self,
        checker: &dyn PermissionChecker,
        user_id: Uuid,
    ) -> Result<bool, DomainError> {
        match self {
            Requirement::Permission { resource, action } => {
                checker.check_permission(user_id, resource, action).await
            }
            Requirement::AnyRole(roles) => checker.has_any_role(user_id, roles).await,
        }
    }
}

/// Require `action` on `resource`
#[derive(Debug, Clone)]
pub struct RequirePermission {
    requirement: Arc<Requirement>,
}

impl RequirePermission {
    pub fn new(resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            requirement: Arc::new(Requirement::Permission {
                resource: resource.into(),
                action: action.into(),
            }),
        }
    }
}

/// Require at least one of the listed roles
#[derive(Debug, Clone)]
pub struct RequireRole {
    requirement: Arc<Requirement>,
}

impl RequireRole {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            requirement: Arc::new(Requirement::AnyRole(
                roles.into_iter().map(Into::into).collect(),
            )),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequirePermission
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthorizationMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthorizationMiddleware {
            service: Rc::new(service),
            requirement: Arc::clone(&self.requirement),
        }))
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthorizationMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthorizationMiddleware {
            service: Rc::new(service),
            requirement: Arc::clone(&self.requirement),
        }))
    }
}

/// Guard service shared by [`RequirePermission`] and [`RequireRole`]
pub struct AuthorizationMiddleware<S> {
    service: Rc<S>,
    requirement: Arc<Requirement>,
}

impl<S, B> Service<ServiceRequest> for AuthorizationMiddleware<S>
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
        let requirement = Arc::clone(&self.requirement);

        Box::pin(async move {
            match authorize(&req, &requirement).await {
                Ok(()) => service
                    .call(req)
                    .await
                    .map(ServiceResponse::map_into_left_body),
                Err(error) => Ok(req.error_response(error).map_into_right_body()),
            }
        })
    }
}

async fn authorize(req: &ServiceRequest, requirement: &Requirement) -> Result<(), ApiError> {
    let Some(context) = req.extensions().get::<AuthContext>().copied() else {
        return Err(ApiError::unauthorized("Authentication required"));
    };

    let Some(checker) = req.app_data::<web::Data<dyn PermissionChecker>>() else {
        tracing::error!("No permission checker registered");
        return Err(ApiError::internal());
    };

    match requirement.is_met(checker.get_ref(), context.user_id).await {
        Ok(true) => Ok(()),
        Ok(false) => {
            tracing::debug!(
                user_id = %context.user_id,
                path = %req.path(),
                "Request denied by authorization guard"
            );
            Err(ApiError::forbidden())
        }
        Err(e) => {
            tracing::error!(error = %e, "Authorization check failed");
            Err(ApiError::internal())
        }
    }
}
