//! In-memory role to grant lookup table

use std::collections::{HashMap, HashSet};

use crate::repositories::RoleGrant;

/// Snapshot of the active role to (resource, action) relation
#[derive(Debug, Default, Clone)]
pub struct PolicyCache {
    grants: HashMap<String, HashSet<(String, String)>>,
}

impl PolicyCache {
    /// Build from the repository's join rows, dropping inactive roles and permissions
    pub fn from_grants(rows: &[RoleGrant]) -> Self {
        let mut grants: HashMap<String, HashSet<(String, String)>> = HashMap::new();
        for row in rows
            .iter()
            .filter(|row| row.role.is_active && row.permission.is_active)
        {
            grants
                .entry(row.role.name.clone())
                .or_default()
                .insert(row.permission.grant());
        }
        Self { grants }
    }

    /// Whether `role` grants `action` on `resource`; unknown roles grant nothing
    pub fn allows(&self, role: &str, resource: &str, action: &str) -> bool {
        self.grants
            .get(role)
            .map(|set| set.contains(&(resource.to_string(), action.to_string())))
            .unwrap_or(false)
    }

    /// Number of (role, grant) pairs
    pub fn len(&self) -> usize {
        self.grants.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::rbac::{Permission, Role};

    fn grant(role: &Role, permission: &Permission) -> RoleGrant {
        RoleGrant {
            role: role.clone(),
            permission: permission.clone(),
        }
    }

    #[test]
    fn test_inactive_rows_are_dropped() {
        let editor = Role::new("editor", "Editor", "");
        let mut retired = Role::new("retired", "Retired", "");
        retired.is_active = false;
        let read = Permission::new("grids:read", "Read", "", "grids", "read");
        let mut delete = Permission::new("grids:delete", "Delete", "", "grids", "delete");
        delete.is_active = false;

        let cache = PolicyCache::from_grants(&[
            grant(&editor, &read),
            grant(&editor, &delete),
            grant(&retired, &read),
        ]);

        assert_eq!(cache.len(), 1);
        assert!(cache.allows("editor", "grids", "read"));
        assert!(!cache.allows("editor", "grids", "delete"));
        assert!(!cache.allows("retired", "grids", "read"));
        assert!(!cache.allows("nobody", "grids", "read"));
    }
}
