//! Tests for AuthorizationEngine

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::rbac::{Permission, Role};
use crate::errors::DomainError;
use crate::repositories::{InMemoryRbacRepository, RbacRepository, RoleGrant};
use crate::services::rbac::{AuthorizationEngine, DEFAULT_PERMISSIONS};

async fn seeded_engine() -> AuthorizationEngine<InMemoryRbacRepository> {
    let engine = AuthorizationEngine::new(Arc::new(InMemoryRbacRepository::new()))
        .await
        .unwrap();
    engine.seed_defaults().await.unwrap();
    engine
}

#[tokio::test]
async fn test_user_without_roles_is_denied() {
    let engine = seeded_engine().await;
    assert!(!engine
        .check_permission(Uuid::new_v4(), "grids", "read")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_default_grants() {
    let engine = seeded_engine().await;
    let admin = Uuid::new_v4();
    let editor = Uuid::new_v4();
    let user = Uuid::new_v4();
    engine.assign_role(admin, "admin").await.unwrap();
    engine.assign_role(editor, "editor").await.unwrap();
    engine.assign_role(user, "user").await.unwrap();

    assert!(engine.check_permission(admin, "system", "admin").await.unwrap());
    assert!(!engine.check_permission(admin, "grids", "own").await.unwrap());
    assert!(engine.check_permission(editor, "grids", "delete").await.unwrap());
    assert!(engine.check_permission(editor, "grids", "own").await.unwrap());
    assert!(!engine.check_permission(editor, "users", "read").await.unwrap());
    assert!(engine.check_permission(user, "grids", "own").await.unwrap());
    assert!(engine.check_permission(user, "ai", "use").await.unwrap());
    assert!(!engine.check_permission(user, "grids", "read").await.unwrap());
}

#[tokio::test]
async fn test_check_normalizes_resource_and_action() {
    let engine = seeded_engine().await;
    let user = Uuid::new_v4();
    engine.assign_role(user, "User").await.unwrap();

    assert!(engine.check_permission(user, " AI ", "Use").await.unwrap());
    assert!(engine.has_role(user, "USER").await.unwrap());
}

#[tokio::test]
async fn test_seed_is_idempotent() {
    let engine = seeded_engine().await;
    let first = engine.sync_policies().await.unwrap();

    engine.seed_defaults().await.unwrap();

    assert_eq!(engine.sync_policies().await.unwrap(), first);
    assert_eq!(engine.get_all_roles().await.unwrap().len(), 3);
    assert_eq!(
        engine.get_all_permissions().await.unwrap().len(),
        DEFAULT_PERMISSIONS.len()
    );
}

#[tokio::test]
async fn test_permissions_are_union_of_roles_without_duplicates() {
    let engine = seeded_engine().await;
    let user_id = Uuid::new_v4();
    engine.assign_role(user_id, "editor").await.unwrap();
    engine.assign_role(user_id, "user").await.unwrap();

    let names: Vec<String> = engine
        .get_user_permissions(user_id)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();

    // editor: grids:* and ai:use; user adds nothing new
    assert_eq!(
        names,
        vec![
            "ai:use",
            "grids:create",
            "grids:delete",
            "grids:own",
            "grids:read",
            "grids:update",
        ]
    );
}

#[tokio::test]
async fn test_deactivated_role_stops_granting() {
    let engine = seeded_engine().await;
    let user_id = Uuid::new_v4();
    engine.assign_role(user_id, "editor").await.unwrap();
    assert!(engine.check_permission(user_id, "grids", "read").await.unwrap());

    assert!(engine.set_role_active("editor", false).await.unwrap());

    assert!(!engine.check_permission(user_id, "grids", "read").await.unwrap());
    assert!(!engine.has_role(user_id, "editor").await.unwrap());
    assert!(engine.get_user_roles(user_id).await.unwrap().is_empty());
    assert!(engine.get_user_permissions(user_id).await.unwrap().is_empty());

    // the assignment survives and takes effect again on reactivation
    assert!(engine.set_role_active("editor", true).await.unwrap());
    assert!(engine.check_permission(user_id, "grids", "read").await.unwrap());
}

#[tokio::test]
async fn test_deactivated_permission_stops_granting() {
    let engine = seeded_engine().await;
    let user_id = Uuid::new_v4();
    engine.assign_role(user_id, "user").await.unwrap();

    assert!(engine.set_permission_active("ai:use", false).await.unwrap());

    assert!(!engine.check_permission(user_id, "ai", "use").await.unwrap());
    assert!(engine.check_permission(user_id, "grids", "own").await.unwrap());
    assert!(!engine.set_permission_active("missing:perm", false).await.unwrap());
}

#[tokio::test]
async fn test_grant_and_revoke_rebuild_cache() {
    let engine = seeded_engine().await;
    let user_id = Uuid::new_v4();
    engine.assign_role(user_id, "user").await.unwrap();
    assert!(!engine.check_permission(user_id, "grids", "read").await.unwrap());

    engine
        .assign_permission_to_role("user", "grids:read")
        .await
        .unwrap();
    assert!(engine.check_permission(user_id, "grids", "read").await.unwrap());

    assert!(engine
        .remove_permission_from_role("user", "grids:read")
        .await
        .unwrap());
    assert!(!engine.check_permission(user_id, "grids", "read").await.unwrap());
    assert!(!engine
        .remove_permission_from_role("user", "grids:read")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_remove_role() {
    let engine = seeded_engine().await;
    let user_id = Uuid::new_v4();
    engine.assign_role(user_id, "editor").await.unwrap();

    assert!(engine.remove_role(user_id, "editor").await.unwrap());
    assert!(!engine.remove_role(user_id, "editor").await.unwrap());
    assert!(!engine.check_permission(user_id, "grids", "read").await.unwrap());
}

#[tokio::test]
async fn test_unknown_names_are_not_found() {
    let engine = seeded_engine().await;

    assert!(matches!(
        engine.assign_role(Uuid::new_v4(), "ghost").await,
        Err(DomainError::NotFound { .. })
    ));
    assert!(matches!(
        engine.assign_permission_to_role("user", "ghost:perm").await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_create_role_and_permission() {
    let engine = seeded_engine().await;

    let role = engine
        .create_role(" Reviewer ", "Reviewer", "Reviews grids")
        .await
        .unwrap();
    assert_eq!(role.name, "reviewer");

    let permission = engine
        .create_permission("Grids:Review", "Review", "", " GRIDS ", "Review")
        .await
        .unwrap();
    assert_eq!(permission.name, "grids:review");
    assert_eq!(permission.resource, "grids");

    assert!(matches!(
        engine.create_role("reviewer", "", "").await,
        Err(DomainError::BusinessRule { .. })
    ));
    assert!(matches!(
        engine.create_role("  ", "", "").await,
        Err(DomainError::Validation { .. })
    ));
    assert!(matches!(
        engine.create_permission("x", "", "", "", "read").await,
        Err(DomainError::Validation { .. })
    ));

    engine
        .assign_permission_to_role("reviewer", "grids:review")
        .await
        .unwrap();
    let user_id = Uuid::new_v4();
    engine.assign_role(user_id, "reviewer").await.unwrap();
    assert!(engine.check_permission(user_id, "grids", "review").await.unwrap());
}

#[tokio::test]
async fn test_policy_cache_loaded_on_construction() {
    let repo = Arc::new(InMemoryRbacRepository::new());
    {
        let engine = AuthorizationEngine::new(Arc::clone(&repo)).await.unwrap();
        engine.seed_defaults().await.unwrap();
    }
    let user_id = Uuid::new_v4();
    let role = repo.find_role_by_name("user").await.unwrap().unwrap();
    repo.assign_role(user_id, role.id).await.unwrap();

    let engine = AuthorizationEngine::new(repo).await.unwrap();
    assert!(engine.check_permission(user_id, "ai", "use").await.unwrap());
}

/// Repository whose next grant listing stalls after reading its snapshot
struct StallingRbacRepository {
    inner: InMemoryRbacRepository,
    stall_next_listing: AtomicBool,
}

#[async_trait]
impl RbacRepository for StallingRbacRepository {
    async fn create_role(&self, role: Role) -> Result<Role, DomainError> {
        self.inner.create_role(role).await
    }

    async fn create_permission(&self, permission: Permission) -> Result<Permission, DomainError> {
        self.inner.create_permission(permission).await
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, DomainError> {
        self.inner.find_role_by_name(name).await
    }

    async fn find_permission_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Permission>, DomainError> {
        self.inner.find_permission_by_name(name).await
    }

    async fn list_roles(&self) -> Result<Vec<Role>, DomainError> {
        self.inner.list_roles().await
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>, DomainError> {
        self.inner.list_permissions().await
    }

    async fn set_role_active(&self, name: &str, is_active: bool) -> Result<bool, DomainError> {
        self.inner.set_role_active(name, is_active).await
    }

    async fn set_permission_active(
        &self,
        name: &str,
        is_active: bool,
    ) -> Result<bool, DomainError> {
        self.inner.set_permission_active(name, is_active).await
    }

    async fn assign_role(&self, user_id: Uuid, role_id: Uuid) -> Result<(), DomainError> {
        self.inner.assign_role(user_id, role_id).await
    }

    async fn remove_role(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, DomainError> {
        self.inner.remove_role(user_id, role_id).await
    }

    async fn get_user_roles(&self, user_id: Uuid) -> Result<Vec<Role>, DomainError> {
        self.inner.get_user_roles(user_id).await
    }

    async fn assign_permission(
        &self,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> Result<(), DomainError> {
        self.inner.assign_permission(role_id, permission_id).await
    }

    async fn remove_permission(
        &self,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> Result<bool, DomainError> {
        self.inner.remove_permission(role_id, permission_id).await
    }

    async fn get_role_permissions(&self, role_id: Uuid) -> Result<Vec<Permission>, DomainError> {
        self.inner.get_role_permissions(role_id).await
    }

    async fn list_role_grants(&self) -> Result<Vec<RoleGrant>, DomainError> {
        let grants = self.inner.list_role_grants().await?;
        if self.stall_next_listing.swap(false, Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        Ok(grants)
    }
}

#[tokio::test]
async fn test_concurrent_grant_and_revoke_keep_latest_policies() {
    let repo = Arc::new(StallingRbacRepository {
        inner: InMemoryRbacRepository::new(),
        stall_next_listing: AtomicBool::new(false),
    });
    let engine = Arc::new(AuthorizationEngine::new(Arc::clone(&repo)).await.unwrap());
    engine.seed_defaults().await.unwrap();
    let user_id = Uuid::new_v4();
    engine.assign_role(user_id, "editor").await.unwrap();

    repo.stall_next_listing.store(true, Ordering::SeqCst);
    let granting = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            engine
                .assign_permission_to_role("editor", "system:admin")
                .await
        })
    };

    // let the grant reach its stalled rebuild before revoking
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(engine
        .remove_permission_from_role("editor", "system:admin")
        .await
        .unwrap());
    granting.await.unwrap().unwrap();

    let role = repo.find_role_by_name("editor").await.unwrap().unwrap();
    let stored = repo.get_role_permissions(role.id).await.unwrap();
    assert!(stored.iter().all(|p| p.name != "system:admin"));
    assert!(!engine
        .check_permission(user_id, "system", "admin")
        .await
        .unwrap());
}
