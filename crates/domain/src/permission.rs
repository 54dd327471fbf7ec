use rolegate_core::PermissionId;
use serde::{Deserialize, Serialize};

/// A named access action, e.g. `users.read`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Stable permission identifier.
    pub id: PermissionId,
    /// Unique permission name.
    pub name: String,
    /// Descriptive hint that the permission is meant to apply everywhere.
    /// Never consulted during resolution; the authoritative scope test is
    /// the null state of a grant's department/employee fields.
    pub is_global: bool,
}
