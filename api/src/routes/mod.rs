//! Route handlers and their registration under `/api/v1`

pub mod auth;
pub mod rbac;

use std::sync::Arc;

use actix_web::web;
use caa_core::repositories::{
    RbacRepository, RefreshTokenRepository, SigningKeyRepository, UserRepository,
};
use caa_core::services::{AuthService, AuthorizationEngine};

use crate::middleware::{JwtAuth, RequirePermission};

/// Services shared by every handler
pub struct AppState<U, R, K, B>
where
    U: UserRepository,
    R: RefreshTokenRepository,
    K: SigningKeyRepository,
    B: RbacRepository,
{
    pub auth_service: Arc<AuthService<U, R, K, B>>,
    pub authorization: Arc<AuthorizationEngine<B>>,
}

impl<U, R, K, B> AppState<U, R, K, B>
where
    U: UserRepository,
    R: RefreshTokenRepository,
    K: SigningKeyRepository,
    B: RbacRepository,
{
    pub fn new(
        auth_service: Arc<AuthService<U, R, K, B>>,
        authorization: Arc<AuthorizationEngine<B>>,
    ) -> Self {
        Self {
            auth_service,
            authorization,
        }
    }
}

/// Register the auth and RBAC routes
pub fn configure<U, R, K, B>(cfg: &mut web::ServiceConfig)
where
    U: UserRepository + 'static,
    R: RefreshTokenRepository + 'static,
    K: SigningKeyRepository + 'static,
    B: RbacRepository + 'static,
{
    cfg.service(
        web::scope("/auth")
            .route("/register", web::post().to(auth::register::<U, R, K, B>))
            .route("/login", web::post().to(auth::login::<U, R, K, B>))
            .route("/refresh", web::post().to(auth::refresh::<U, R, K, B>))
            .route("/revoke", web::post().to(auth::revoke::<U, R, K, B>))
            .route(
                "/logout",
                web::post()
                    .to(auth::logout::<U, R, K, B>)
                    .wrap(JwtAuth::new()),
            )
            .route(
                "/me",
                web::get().to(auth::me::<U, R, K, B>).wrap(JwtAuth::new()),
            )
            .route(
                "/editor-password",
                web::post()
                    .to(auth::validate_editor_password::<U, R, K, B>)
                    .wrap(JwtAuth::new()),
            ),
    )
    .service(
        web::scope("/rbac")
            .wrap(JwtAuth::new())
            .route("/me/roles", web::get().to(rbac::my_roles::<U, R, K, B>))
            .route(
                "/me/permissions",
                web::get().to(rbac::my_permissions::<U, R, K, B>),
            )
            .service(
                web::resource("/roles")
                    .route(
                        web::get()
                            .to(rbac::list_roles::<U, R, K, B>)
                            .wrap(RequirePermission::new("roles", "read")),
                    )
                    .route(
                        web::post()
                            .to(rbac::create_role::<U, R, K, B>)
                            .wrap(RequirePermission::new("roles", "update")),
                    ),
            )
            .service(
                web::resource("/permissions")
                    .route(
                        web::get()
                            .to(rbac::list_permissions::<U, R, K, B>)
                            .wrap(RequirePermission::new("roles", "read")),
                    )
                    .route(
                        web::post()
                            .to(rbac::create_permission::<U, R, K, B>)
                            .wrap(RequirePermission::new("roles", "update")),
                    ),
            )
            .service(
                web::resource("/roles/{role}/permissions/{permission}")
                    .route(
                        web::post()
                            .to(rbac::grant_permission::<U, R, K, B>)
                            .wrap(RequirePermission::new("roles", "update")),
                    )
                    .route(
                        web::delete()
                            .to(rbac::revoke_permission::<U, R, K, B>)
                            .wrap(RequirePermission::new("roles", "update")),
                    ),
            )
            .route(
                "/users/{user_id}/roles",
                web::get()
                    .to(rbac::user_roles::<U, R, K, B>)
                    .wrap(RequirePermission::new("roles", "read")),
            )
            .service(
                web::resource("/users/{user_id}/roles/{role}")
                    .route(
                        web::post()
                            .to(rbac::assign_role::<U, R, K, B>)
                            .wrap(RequirePermission::new("roles", "update")),
                    )
                    .route(
                        web::delete()
                            .to(rbac::remove_role::<U, R, K, B>)
                            .wrap(RequirePermission::new("roles", "update")),
                    ),
            )
            .route(
                "/users/{user_id}/check",
                web::get()
                    .to(rbac::check_permission::<U, R, K, B>)
                    .wrap(RequirePermission::new("roles", "read")),
            ),
    );
}
