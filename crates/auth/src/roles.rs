use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::permissions::{ITEMS_MANAGE, ITEMS_READ, Permission};

/// Role identifier used for RBAC.
///
/// Roles are opaque strings at this layer; [`role_permissions`] is the single
/// policy table mapping them to permissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Permissions granted by a single role.
///
/// Unknown roles grant nothing. `admin` gets the wildcard rather than an
/// ever-growing list.
pub fn role_permissions(role: &Role) -> Vec<Permission> {
    match role.as_str() {
        "user" => vec![Permission::new(ITEMS_READ), Permission::new(ITEMS_MANAGE)],
        "admin" => vec![Permission::wildcard()],
        _ => Vec::new(),
    }
}

/// Union of the permissions granted by a set of roles.
pub fn permissions_from_roles(roles: &[Role]) -> Vec<Permission> {
    let mut permissions: Vec<Permission> = Vec::new();
    for role in roles {
        for permission in role_permissions(role) {
            if !permissions.contains(&permission) {
                permissions.push(permission);
            }
        }
    }
    permissions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_role_grants_item_permissions_only() {
        let perms = role_permissions(&Role::new("user"));
        assert!(perms.iter().any(|p| p.as_str() == ITEMS_READ));
        assert!(perms.iter().any(|p| p.as_str() == ITEMS_MANAGE));
        assert!(!perms.iter().any(|p| p.is_wildcard()));
    }

    #[test]
    fn admin_role_grants_wildcard() {
        let perms = role_permissions(&Role::new("admin"));
        assert_eq!(perms, vec![Permission::wildcard()]);
    }

    #[test]
    fn unknown_roles_grant_nothing() {
        assert!(role_permissions(&Role::new("viewer")).is_empty());
    }

    #[test]
    fn union_deduplicates() {
        let perms = permissions_from_roles(&[Role::new("user"), Role::new("user")]);
        assert_eq!(perms.len(), 2);
    }
}
