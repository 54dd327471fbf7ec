use serde::{Deserialize, Serialize};

/// Stable audit actions emitted by the engine's mutations and resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a department is created.
    DepartmentCreated,
    /// Emitted when a department is renamed.
    DepartmentUpdated,
    /// Emitted when a department is soft-deleted.
    DepartmentDeleted,
    /// Emitted when a permission is created.
    PermissionCreated,
    /// Emitted when a permission is updated.
    PermissionUpdated,
    /// Emitted when a permission is soft-deleted.
    PermissionDeleted,
    /// Emitted when a role is created.
    RoleCreated,
    /// Emitted when a role is updated or re-parented.
    RoleUpdated,
    /// Emitted when a role is soft-deleted.
    RoleDeleted,
    /// Emitted when a role is assigned to an employee.
    RoleAssigned,
    /// Emitted when an employee's assignment is moved to another role.
    RoleReassigned,
    /// Emitted when a role assignment is revoked.
    RoleUnassigned,
    /// Emitted when a scoped grant is attached to a role.
    GrantAdded,
    /// Emitted when a scoped grant is updated.
    GrantUpdated,
    /// Emitted when a scoped grant is removed.
    GrantRemoved,
    /// Emitted for every permission resolution, with its verdict.
    PermissionChecked,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DepartmentCreated => "department.created",
            Self::DepartmentUpdated => "department.updated",
            Self::DepartmentDeleted => "department.deleted",
            Self::PermissionCreated => "permission.created",
            Self::PermissionUpdated => "permission.updated",
            Self::PermissionDeleted => "permission.deleted",
            Self::RoleCreated => "role.created",
            Self::RoleUpdated => "role.updated",
            Self::RoleDeleted => "role.deleted",
            Self::RoleAssigned => "role.assigned",
            Self::RoleReassigned => "role.reassigned",
            Self::RoleUnassigned => "role.unassigned",
            Self::GrantAdded => "grant.added",
            Self::GrantUpdated => "grant.updated",
            Self::GrantRemoved => "grant.removed",
            Self::PermissionChecked => "permission.checked",
        }
    }
}
