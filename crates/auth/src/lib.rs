//! `pantry-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage. Callers hand
//! it a bearer token and a clock; it hands back verified claims and yes/no
//! permission decisions.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod permissions;
pub mod roles;

pub use authorize::{AuthzError, Principal, authorize};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtValidator};
pub use permissions::{ITEMS_MANAGE, ITEMS_READ, Permission};
pub use roles::{Role, permissions_from_roles, role_permissions};
