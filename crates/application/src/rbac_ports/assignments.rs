use async_trait::async_trait;
use rolegate_core::{AppResult, EmployeeId, RoleId};
use rolegate_domain::RoleAssignment;

/// Repository port for the (employee, role) assignment table.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Lists an employee's live assignments.
    async fn list_assignments_for_employee(
        &self,
        employee_id: EmployeeId,
    ) -> AppResult<Vec<RoleAssignment>>;

    /// Lists live assignments for many employees at once (IN-list read).
    async fn list_assignments_for_employees(
        &self,
        employee_ids: &[EmployeeId],
    ) -> AppResult<Vec<RoleAssignment>>;

    /// Returns one live assignment pair, if present.
    async fn find_assignment(
        &self,
        employee_id: EmployeeId,
        role_id: RoleId,
    ) -> AppResult<Option<RoleAssignment>>;

    /// Creates an assignment. Fails with `Conflict` when the pair already
    /// exists.
    async fn create_assignment(
        &self,
        employee_id: EmployeeId,
        role_id: RoleId,
    ) -> AppResult<RoleAssignment>;

    /// Creates an assignment unless the pair already exists (idempotent
    /// create-if-absent, used by bulk assignment).
    async fn create_assignment_if_absent(
        &self,
        employee_id: EmployeeId,
        role_id: RoleId,
    ) -> AppResult<()>;

    /// Moves one assignment pair from one role to another.
    async fn reassign(
        &self,
        employee_id: EmployeeId,
        from_role_id: RoleId,
        to_role_id: RoleId,
    ) -> AppResult<()>;

    /// Soft-deletes one assignment pair.
    async fn delete_assignment(&self, employee_id: EmployeeId, role_id: RoleId) -> AppResult<()>;

    /// Soft-deletes all of an employee's assignments for the given roles
    /// (IN-list delete). Pairs that do not exist are ignored.
    async fn delete_assignments(
        &self,
        employee_id: EmployeeId,
        role_ids: &[RoleId],
    ) -> AppResult<()>;

    /// Returns the distinct employees holding any of the given roles
    /// (IN-list read).
    async fn list_employees_for_roles(&self, role_ids: &[RoleId]) -> AppResult<Vec<EmployeeId>>;
}
