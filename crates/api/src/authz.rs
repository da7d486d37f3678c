//! API-side authorization guard.
//!
//! Enforces the role→permission policy at the route boundary, keeping the
//! domain and infra crates auth-agnostic.

use pantry_auth::{AuthzError, Permission, Principal, authorize, permissions_from_roles};

use crate::context::PrincipalContext;

/// Check one required permission in the current request context.
///
/// Called at the top of every protected handler, before any service call.
pub fn require_permission(
    principal: &PrincipalContext,
    required: &Permission,
) -> Result<(), AuthzError> {
    let principal = Principal {
        user_id: principal.user_id(),
        name: principal.name().to_string(),
        roles: principal.roles().to_vec(),
        permissions: permissions_from_roles(principal.roles()),
    };

    authorize(&principal, required)
}
