use pantry_auth::Role;
use pantry_core::UserId;

/// Principal context for a request (authenticated identity + roles).
///
/// Inserted by the auth middleware; must be present for all domain routes.
/// `name` is the display name stamped into `updated_by` on writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    user_id: UserId,
    name: String,
    roles: Vec<Role>,
}

impl PrincipalContext {
    pub fn new(user_id: UserId, name: String, roles: Vec<Role>) -> Self {
        Self {
            user_id,
            name,
            roles,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}
