use async_trait::async_trait;
use rolegate_core::{AppResult, DepartmentId, EmployeeId, GrantId, PermissionId, RoleId};
use rolegate_domain::ScopedGrant;

/// Input payload for creating or replacing a scoped grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrantInput {
    /// Role the permission is attached to.
    pub role_id: RoleId,
    /// Granted permission.
    pub permission_id: PermissionId,
    /// Optional department restriction; `None` is a blanket axis.
    pub department_id: Option<DepartmentId>,
    /// Optional target-employee restriction; `None` is a blanket axis.
    pub employee_id: Option<EmployeeId>,
}

/// Repository port for the scoped grant table.
#[async_trait]
pub trait GrantRepository: Send + Sync {
    /// Returns a live grant by id.
    async fn find_grant(&self, grant_id: GrantId) -> AppResult<Option<ScopedGrant>>;

    /// Lists live grants, optionally filtered by role.
    async fn list_grants(&self, role_id: Option<RoleId>) -> AppResult<Vec<ScopedGrant>>;

    /// Returns all live grants attached directly to any of the given roles
    /// (IN-list read).
    async fn list_grants_for_roles(&self, role_ids: &[RoleId]) -> AppResult<Vec<ScopedGrant>>;

    /// Creates a grant and returns the persisted row.
    async fn create_grant(&self, input: GrantInput) -> AppResult<ScopedGrant>;

    /// Replaces a live grant's fields and returns the persisted row.
    async fn update_grant(&self, grant_id: GrantId, input: GrantInput) -> AppResult<ScopedGrant>;

    /// Soft-deletes a live grant.
    async fn soft_delete_grant(&self, grant_id: GrantId) -> AppResult<()>;
}
