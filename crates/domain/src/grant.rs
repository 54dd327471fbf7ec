use rolegate_core::{DepartmentId, EmployeeId, GrantId, PermissionId, RoleId};
use serde::{Deserialize, Serialize};

/// A permission granted to a role, optionally restricted to one department
/// and/or one target employee. A null axis is a blanket grant along that
/// axis: the grant applies regardless of the corresponding scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedGrant {
    /// Stable grant identifier.
    pub id: GrantId,
    /// Role the permission is attached to.
    pub role_id: RoleId,
    /// Granted permission.
    pub permission_id: PermissionId,
    /// Optional department restriction.
    pub department_id: Option<DepartmentId>,
    /// Optional target-employee restriction.
    pub employee_id: Option<EmployeeId>,
}

impl ScopedGrant {
    /// Returns whether this grant satisfies a check for `permission_id`
    /// under the given scopes. This is the single authoritative scope test:
    /// a restricted axis must equal the requested scope exactly, a null axis
    /// always matches.
    #[must_use]
    pub fn matches(
        &self,
        permission_id: PermissionId,
        department_scope: Option<DepartmentId>,
        target_scope: Option<EmployeeId>,
    ) -> bool {
        if self.permission_id != permission_id {
            return false;
        }

        let department_ok = match self.department_id {
            None => true,
            Some(restricted) => department_scope == Some(restricted),
        };
        let employee_ok = match self.employee_id {
            None => true,
            Some(restricted) => target_scope == Some(restricted),
        };

        department_ok && employee_ok
    }

    /// Returns whether both restriction axes are null.
    #[must_use]
    pub fn is_blanket(&self) -> bool {
        self.department_id.is_none() && self.employee_id.is_none()
    }
}
