use chrono::{DateTime, Utc};
use rolegate_core::{DepartmentId, EmployeeId, RoleId};
use serde::{Deserialize, Serialize};

/// A hierarchical position within a department. Roles form a forest via
/// `parent_role_id`; a role inherits everything grantable to its ancestors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Stable role identifier.
    pub id: RoleId,
    /// Role name, unique within its department.
    pub name: String,
    /// Owning department.
    pub department_id: DepartmentId,
    /// Optional parent role for inheritance.
    pub parent_role_id: Option<RoleId>,
    /// Descriptive hint, never consulted during resolution.
    pub is_global: bool,
}

/// A unique (employee, role) membership pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Assigned employee.
    pub employee_id: EmployeeId,
    /// Assigned role.
    pub role_id: RoleId,
    /// Assignment timestamp.
    pub assigned_at: DateTime<Utc>,
}
