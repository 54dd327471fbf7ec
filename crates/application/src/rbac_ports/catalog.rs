use async_trait::async_trait;
use rolegate_core::{AppResult, DepartmentId, NonEmptyString, PermissionId};
use rolegate_domain::{Department, Permission};

/// Repository port for the department table.
#[async_trait]
pub trait DepartmentRepository: Send + Sync {
    /// Returns a live department by id.
    async fn find_department(&self, department_id: DepartmentId) -> AppResult<Option<Department>>;

    /// Lists live departments.
    async fn list_departments(&self) -> AppResult<Vec<Department>>;

    /// Creates a department and returns the persisted row.
    async fn create_department(&self, name: NonEmptyString) -> AppResult<Department>;

    /// Renames a live department and returns the persisted row.
    async fn update_department(
        &self,
        department_id: DepartmentId,
        name: NonEmptyString,
    ) -> AppResult<Department>;

    /// Soft-deletes a live department.
    async fn soft_delete_department(&self, department_id: DepartmentId) -> AppResult<()>;
}

/// Repository port for the permission table.
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// Returns a live permission by id.
    async fn find_permission(&self, permission_id: PermissionId) -> AppResult<Option<Permission>>;

    /// Returns a live permission by its unique name.
    async fn find_permission_by_name(&self, name: &str) -> AppResult<Option<Permission>>;

    /// Returns live permissions matching the given ids (IN-list read).
    async fn find_permissions_by_ids(
        &self,
        permission_ids: &[PermissionId],
    ) -> AppResult<Vec<Permission>>;

    /// Lists live permissions.
    async fn list_permissions(&self) -> AppResult<Vec<Permission>>;

    /// Creates a permission and returns the persisted row.
    async fn create_permission(
        &self,
        name: NonEmptyString,
        is_global: bool,
    ) -> AppResult<Permission>;

    /// Updates a live permission and returns the persisted row.
    async fn update_permission(
        &self,
        permission_id: PermissionId,
        name: NonEmptyString,
        is_global: bool,
    ) -> AppResult<Permission>;

    /// Soft-deletes a live permission.
    async fn soft_delete_permission(&self, permission_id: PermissionId) -> AppResult<()>;
}
