//! Role and permission route handlers
//!
//! Everything here sits behind `JwtAuth`. The `me` endpoints are open to any
//! authenticated caller; the rest are guarded per route.

use actix_web::{web, HttpResponse};
use caa_core::domain::entities::Permission;
use caa_core::errors::DomainError;
use caa_core::repositories::{
    RbacRepository, RefreshTokenRepository, SigningKeyRepository, UserRepository,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::rbac::{
    CreatePermissionRequest, CreateRoleRequest, PermissionCheckQuery, PermissionCheckResponse,
    PermissionResponse, RoleResponse,
};
use crate::handlers::error::ApiError;
use crate::middleware::auth::AuthContext;

use super::AppState;

/// Handler for GET /api/v1/rbac/me/roles
pub async fn my_roles<U, R, K, B>(
    state: web::Data<AppState<U, R, K, B>>,
    auth: AuthContext,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    R: RefreshTokenRepository + 'static,
    K: SigningKeyRepository + 'static,
    B: RbacRepository + 'static,
{
    roles_of(&state, auth.user_id).await
}

/// Handler for GET /api/v1/rbac/me/permissions
pub async fn my_permissions<U, R, K, B>(
    state: web::Data<AppState<U, R, K, B>>,
    auth: AuthContext,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    R: RefreshTokenRepository + 'static,
    K: SigningKeyRepository + 'static,
    B: RbacRepository + 'static,
{
    let permissions: Vec<PermissionResponse> = state
        .authorization
        .get_user_permissions(auth.user_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(HttpResponse::Ok().json(permissions))
}

/// Handler for GET /api/v1/rbac/users/{user_id}/roles
pub async fn user_roles<U, R, K, B>(
    state: web::Data<AppState<U, R, K, B>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    R: RefreshTokenRepository + 'static,
    K: SigningKeyRepository + 'static,
    B: RbacRepository + 'static,
{
    roles_of(&state, path.into_inner()).await
}

async fn roles_of<U, R, K, B>(
    state: &AppState<U, R, K, B>,
    user_id: Uuid,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository,
    R: RefreshTokenRepository,
    K: SigningKeyRepository,
    B: RbacRepository,
{
    let roles: Vec<RoleResponse> = state
        .authorization
        .get_user_roles(user_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(HttpResponse::Ok().json(roles))
}

/// Handler for GET /api/v1/rbac/roles
pub async fn list_roles<U, R, K, B>(
    state: web::Data<AppState<U, R, K, B>>,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    R: RefreshTokenRepository + 'static,
    K: SigningKeyRepository + 'static,
    B: RbacRepository + 'static,
{
    let roles: Vec<RoleResponse> = state
        .authorization
        .get_all_roles()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(HttpResponse::Ok().json(roles))
}

/// Handler for POST /api/v1/rbac/roles
///
/// ## Errors
/// - 409 Conflict: A role with that name exists
pub async fn create_role<U, R, K, B>(
    state: web::Data<AppState<U, R, K, B>>,
    request: web::Json<CreateRoleRequest>,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    R: RefreshTokenRepository + 'static,
    K: SigningKeyRepository + 'static,
    B: RbacRepository + 'static,
{
    request.validate()?;

    let role = state
        .authorization
        .create_role(&request.name, &request.display_name, &request.description)
        .await?;

    Ok(HttpResponse::Created().json(RoleResponse::from(role)))
}

/// Handler for GET /api/v1/rbac/permissions
pub async fn list_permissions<U, R, K, B>(
    state: web::Data<AppState<U, R, K, B>>,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    R: RefreshTokenRepository + 'static,
    K: SigningKeyRepository + 'static,
    B: RbacRepository + 'static,
{
    let permissions: Vec<PermissionResponse> = state
        .authorization
        .get_all_permissions()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(HttpResponse::Ok().json(permissions))
}

/// Handler for POST /api/v1/rbac/permissions
///
/// The permission is named `resource:action`.
pub async fn create_permission<U, R, K, B>(
    state: web::Data<AppState<U, R, K, B>>,
    request: web::Json<CreatePermissionRequest>,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    R: RefreshTokenRepository + 'static,
    K: SigningKeyRepository + 'static,
    B: RbacRepository + 'static,
{
    request.validate()?;

    let name = Permission::qualified_name(&request.resource, &request.action);
    let permission = state
        .authorization
        .create_permission(
            &name,
            &request.display_name,
            &request.description,
            &request.resource,
            &request.action,
        )
        .await?;

    Ok(HttpResponse::Created().json(PermissionResponse::from(permission)))
}

/// Handler for POST /api/v1/rbac/roles/{role}/permissions/{permission}
pub async fn grant_permission<U, R, K, B>(
    state: web::Data<AppState<U, R, K, B>>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    R: RefreshTokenRepository + 'static,
    K: SigningKeyRepository + 'static,
    B: RbacRepository + 'static,
{
    let (role, permission) = path.into_inner();
    state
        .authorization
        .assign_permission_to_role(&role, &permission)
        .await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Handler for DELETE /api/v1/rbac/roles/{role}/permissions/{permission}
///
/// ## Errors
/// - 404 Not Found: Unknown role or permission, or the grant does not exist
pub async fn revoke_permission<U, R, K, B>(
    state: web::Data<AppState<U, R, K, B>>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    R: RefreshTokenRepository + 'static,
    K: SigningKeyRepository + 'static,
    B: RbacRepository + 'static,
{
    let (role, permission) = path.into_inner();
    let removed = state
        .authorization
        .remove_permission_from_role(&role, &permission)
        .await?;

    if !removed {
        return Err(DomainError::not_found(format!("grant of {} to {}", permission, role)).into());
    }
    Ok(HttpResponse::NoContent().finish())
}

/// Handler for POST /api/v1/rbac/users/{user_id}/roles/{role}
///
/// Assigning a role the user already holds succeeds.
pub async fn assign_role<U, R, K, B>(
    state: web::Data<AppState<U, R, K, B>>,
    path: web::Path<(Uuid, String)>,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    R: RefreshTokenRepository + 'static,
    K: SigningKeyRepository + 'static,
    B: RbacRepository + 'static,
{
    let (user_id, role) = path.into_inner();
    state.authorization.assign_role(user_id, &role).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Handler for DELETE /api/v1/rbac/users/{user_id}/roles/{role}
pub async fn remove_role<U, R, K, B>(
    state: web::Data<AppState<U, R, K, B>>,
    path: web::Path<(Uuid, String)>,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    R: RefreshTokenRepository + 'static,
    K: SigningKeyRepository + 'static,
    B: RbacRepository + 'static,
{
    let (user_id, role) = path.into_inner();
    if !state.authorization.remove_role(user_id, &role).await? {
        return Err(DomainError::not_found(format!("role {} of user {}", role, user_id)).into());
    }

    Ok(HttpResponse::NoContent().finish())
}

/// Handler for GET /api/v1/rbac/users/{user_id}/check?resource=..&action=..
pub async fn check_permission<U, R, K, B>(
    state: web::Data<AppState<U, R, K, B>>,
    path: web::Path<Uuid>,
    query: web::Query<PermissionCheckQuery>,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    R: RefreshTokenRepository + 'static,
    K: SigningKeyRepository + 'static,
    B: RbacRepository + 'static,
{
    query.validate()?;

    let user_id = path.into_inner();
    let query = query.into_inner();
    let allowed = state
        .authorization
        .check_permission(user_id, &query.resource, &query.action)
        .await?;

    Ok(HttpResponse::Ok().json(PermissionCheckResponse {
        user_id,
        resource: query.resource,
        action: query.action,
        allowed,
    }))
}
