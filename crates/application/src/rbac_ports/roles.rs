use async_trait::async_trait;
use rolegate_core::{AppResult, DepartmentId, NonEmptyString, RoleId};
use rolegate_domain::Role;

/// Input payload for creating a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Role name, unique within the department.
    pub name: NonEmptyString,
    /// Owning department.
    pub department_id: DepartmentId,
    /// Optional parent role for inheritance.
    pub parent_role_id: Option<RoleId>,
    /// Descriptive global hint.
    pub is_global: bool,
}

/// Input payload for updating a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRoleInput {
    /// New role name.
    pub name: NonEmptyString,
    /// New owning department.
    pub department_id: DepartmentId,
    /// New parent role, or `None` to detach the role into a root.
    pub parent_role_id: Option<RoleId>,
    /// Descriptive global hint.
    pub is_global: bool,
}

/// Repository port for the role table. Soft-deleted roles are invisible to
/// every read.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Returns a live role by id.
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Lists live roles, optionally filtered by department.
    async fn list_roles(&self, department_id: Option<DepartmentId>) -> AppResult<Vec<Role>>;

    /// Creates a role and returns the persisted row.
    async fn create_role(&self, input: CreateRoleInput) -> AppResult<Role>;

    /// Updates a live role and returns the persisted row.
    async fn update_role(&self, role_id: RoleId, input: UpdateRoleInput) -> AppResult<Role>;

    /// Soft-deletes a live role.
    async fn soft_delete_role(&self, role_id: RoleId) -> AppResult<()>;
}
