use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Read access to items and their stock-update history.
pub const ITEMS_READ: &str = "items.read";
/// Create/update/delete items and record stock adjustments.
pub const ITEMS_MANAGE: &str = "items.manage";

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "items.read"). The
/// wildcard permission `"*"` means "allow all" without hardcoding every
/// permission into tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn wildcard() -> Self {
        Self(Cow::Borrowed("*"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
