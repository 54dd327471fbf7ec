use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use rolegate_application::{
    AssignmentRepository, AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository, AuditSink,
    CreateRoleInput, DepartmentRepository, GrantInput, GrantRepository, PermissionRepository,
    RoleRepository, UpdateRoleInput,
};
use rolegate_core::{
    AppError, AppResult, DepartmentId, EmployeeId, GrantId, NonEmptyString, PermissionId, RoleId,
};
use rolegate_domain::{Department, Permission, Role, RoleAssignment, ScopedGrant};

/// In-memory implementation of every repository port plus the audit sink.
/// Deleted rows are dropped outright; only audit entries outlive their
/// subjects, as they do under soft deletion.
#[derive(Debug, Default)]
pub struct InMemoryRbacRepository {
    departments: RwLock<HashMap<DepartmentId, Department>>,
    permissions: RwLock<HashMap<PermissionId, Permission>>,
    roles: RwLock<HashMap<RoleId, Role>>,
    assignments: RwLock<Vec<RoleAssignment>>,
    grants: RwLock<HashMap<GrantId, ScopedGrant>>,
    audit_entries: RwLock<Vec<AuditLogEntry>>,
    next_id: AtomicI64,
}

impl InMemoryRbacRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl DepartmentRepository for InMemoryRbacRepository {
    async fn find_department(&self, department_id: DepartmentId) -> AppResult<Option<Department>> {
        Ok(self.departments.read().await.get(&department_id).cloned())
    }

    async fn list_departments(&self) -> AppResult<Vec<Department>> {
        let departments = self.departments.read().await;
        let mut listed: Vec<Department> = departments.values().cloned().collect();
        listed.sort_by_key(|department| department.id);
        Ok(listed)
    }

    async fn create_department(&self, name: NonEmptyString) -> AppResult<Department> {
        let department = Department {
            id: DepartmentId::new(self.allocate_id())?,
            name: name.as_str().to_owned(),
        };
        self.departments
            .write()
            .await
            .insert(department.id, department.clone());
        Ok(department)
    }

    async fn update_department(
        &self,
        department_id: DepartmentId,
        name: NonEmptyString,
    ) -> AppResult<Department> {
        let mut departments = self.departments.write().await;
        let Some(department) = departments.get_mut(&department_id) else {
            return Err(AppError::NotFound(format!("department {department_id}")));
        };
        department.name = name.as_str().to_owned();
        Ok(department.clone())
    }

    async fn soft_delete_department(&self, department_id: DepartmentId) -> AppResult<()> {
        if self
            .departments
            .write()
            .await
            .remove(&department_id)
            .is_none()
        {
            return Err(AppError::NotFound(format!("department {department_id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl PermissionRepository for InMemoryRbacRepository {
    async fn find_permission(&self, permission_id: PermissionId) -> AppResult<Option<Permission>> {
        Ok(self.permissions.read().await.get(&permission_id).cloned())
    }

    async fn find_permission_by_name(&self, name: &str) -> AppResult<Option<Permission>> {
        let permissions = self.permissions.read().await;
        Ok(permissions
            .values()
            .find(|permission| permission.name == name)
            .cloned())
    }

    async fn find_permissions_by_ids(
        &self,
        permission_ids: &[PermissionId],
    ) -> AppResult<Vec<Permission>> {
        let permissions = self.permissions.read().await;
        Ok(permission_ids
            .iter()
            .filter_map(|permission_id| permissions.get(permission_id).cloned())
            .collect())
    }

    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        let permissions = self.permissions.read().await;
        let mut listed: Vec<Permission> = permissions.values().cloned().collect();
        listed.sort_by_key(|permission| permission.id);
        Ok(listed)
    }

    async fn create_permission(
        &self,
        name: NonEmptyString,
        is_global: bool,
    ) -> AppResult<Permission> {
        let mut permissions = self.permissions.write().await;
        if permissions
            .values()
            .any(|permission| permission.name == name.as_str())
        {
            return Err(AppError::Conflict(format!(
                "permission '{}' already exists",
                name.as_str()
            )));
        }

        let permission = Permission {
            id: PermissionId::new(self.allocate_id())?,
            name: name.as_str().to_owned(),
            is_global,
        };
        permissions.insert(permission.id, permission.clone());
        Ok(permission)
    }

    async fn update_permission(
        &self,
        permission_id: PermissionId,
        name: NonEmptyString,
        is_global: bool,
    ) -> AppResult<Permission> {
        let mut permissions = self.permissions.write().await;
        let Some(permission) = permissions.get_mut(&permission_id) else {
            return Err(AppError::NotFound(format!("permission {permission_id}")));
        };
        permission.name = name.as_str().to_owned();
        permission.is_global = is_global;
        Ok(permission.clone())
    }

    async fn soft_delete_permission(&self, permission_id: PermissionId) -> AppResult<()> {
        if self
            .permissions
            .write()
            .await
            .remove(&permission_id)
            .is_none()
        {
            return Err(AppError::NotFound(format!("permission {permission_id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl RoleRepository for InMemoryRbacRepository {
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.roles.read().await.get(&role_id).cloned())
    }

    async fn list_roles(&self, department_id: Option<DepartmentId>) -> AppResult<Vec<Role>> {
        let roles = self.roles.read().await;
        let mut listed: Vec<Role> = roles
            .values()
            .filter(|role| department_id.is_none_or(|dept| role.department_id == dept))
            .cloned()
            .collect();
        listed.sort_by_key(|role| role.id);
        Ok(listed)
    }

    async fn create_role(&self, input: CreateRoleInput) -> AppResult<Role> {
        let role = Role {
            id: RoleId::new(self.allocate_id())?,
            name: input.name.as_str().to_owned(),
            department_id: input.department_id,
            parent_role_id: input.parent_role_id,
            is_global: input.is_global,
        };
        self.roles.write().await.insert(role.id, role.clone());
        Ok(role)
    }

    async fn update_role(&self, role_id: RoleId, input: UpdateRoleInput) -> AppResult<Role> {
        let mut roles = self.roles.write().await;
        let Some(role) = roles.get_mut(&role_id) else {
            return Err(AppError::NotFound(format!("role {role_id}")));
        };
        role.name = input.name.as_str().to_owned();
        role.department_id = input.department_id;
        role.parent_role_id = input.parent_role_id;
        role.is_global = input.is_global;
        Ok(role.clone())
    }

    async fn soft_delete_role(&self, role_id: RoleId) -> AppResult<()> {
        if self.roles.write().await.remove(&role_id).is_none() {
            return Err(AppError::NotFound(format!("role {role_id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryRbacRepository {
    async fn list_assignments_for_employee(
        &self,
        employee_id: EmployeeId,
    ) -> AppResult<Vec<RoleAssignment>> {
        let assignments = self.assignments.read().await;
        Ok(assignments
            .iter()
            .filter(|assignment| assignment.employee_id == employee_id)
            .cloned()
            .collect())
    }

    async fn list_assignments_for_employees(
        &self,
        employee_ids: &[EmployeeId],
    ) -> AppResult<Vec<RoleAssignment>> {
        let assignments = self.assignments.read().await;
        Ok(assignments
            .iter()
            .filter(|assignment| employee_ids.contains(&assignment.employee_id))
            .cloned()
            .collect())
    }

    async fn find_assignment(
        &self,
        employee_id: EmployeeId,
        role_id: RoleId,
    ) -> AppResult<Option<RoleAssignment>> {
        let assignments = self.assignments.read().await;
        Ok(assignments
            .iter()
            .find(|assignment| {
                assignment.employee_id == employee_id && assignment.role_id == role_id
            })
            .cloned())
    }

    async fn create_assignment(
        &self,
        employee_id: EmployeeId,
        role_id: RoleId,
    ) -> AppResult<RoleAssignment> {
        let mut assignments = self.assignments.write().await;
        if assignments.iter().any(|assignment| {
            assignment.employee_id == employee_id && assignment.role_id == role_id
        }) {
            return Err(AppError::Conflict(format!(
                "employee {employee_id} already holds role {role_id}"
            )));
        }

        let assignment = RoleAssignment {
            employee_id,
            role_id,
            assigned_at: Utc::now(),
        };
        assignments.push(assignment.clone());
        Ok(assignment)
    }

    async fn create_assignment_if_absent(
        &self,
        employee_id: EmployeeId,
        role_id: RoleId,
    ) -> AppResult<()> {
        let mut assignments = self.assignments.write().await;
        if !assignments.iter().any(|assignment| {
            assignment.employee_id == employee_id && assignment.role_id == role_id
        }) {
            assignments.push(RoleAssignment {
                employee_id,
                role_id,
                assigned_at: Utc::now(),
            });
        }
        Ok(())
    }

    async fn reassign(
        &self,
        employee_id: EmployeeId,
        from_role_id: RoleId,
        to_role_id: RoleId,
    ) -> AppResult<()> {
        let mut assignments = self.assignments.write().await;
        let Some(assignment) = assignments.iter_mut().find(|assignment| {
            assignment.employee_id == employee_id && assignment.role_id == from_role_id
        }) else {
            return Err(AppError::NotFound(format!(
                "assignment of role {from_role_id} to employee {employee_id}"
            )));
        };
        assignment.role_id = to_role_id;
        assignment.assigned_at = Utc::now();
        Ok(())
    }

    async fn delete_assignment(&self, employee_id: EmployeeId, role_id: RoleId) -> AppResult<()> {
        let mut assignments = self.assignments.write().await;
        let before = assignments.len();
        assignments.retain(|assignment| {
            !(assignment.employee_id == employee_id && assignment.role_id == role_id)
        });
        if assignments.len() == before {
            return Err(AppError::NotFound(format!(
                "assignment of role {role_id} to employee {employee_id}"
            )));
        }
        Ok(())
    }

    async fn delete_assignments(
        &self,
        employee_id: EmployeeId,
        role_ids: &[RoleId],
    ) -> AppResult<()> {
        let mut assignments = self.assignments.write().await;
        assignments.retain(|assignment| {
            !(assignment.employee_id == employee_id && role_ids.contains(&assignment.role_id))
        });
        Ok(())
    }

    async fn list_employees_for_roles(&self, role_ids: &[RoleId]) -> AppResult<Vec<EmployeeId>> {
        let assignments = self.assignments.read().await;
        let mut employees: Vec<EmployeeId> = assignments
            .iter()
            .filter(|assignment| role_ids.contains(&assignment.role_id))
            .map(|assignment| assignment.employee_id)
            .collect();
        employees.sort();
        employees.dedup();
        Ok(employees)
    }
}

#[async_trait]
impl GrantRepository for InMemoryRbacRepository {
    async fn find_grant(&self, grant_id: GrantId) -> AppResult<Option<ScopedGrant>> {
        Ok(self.grants.read().await.get(&grant_id).cloned())
    }

    async fn list_grants(&self, role_id: Option<RoleId>) -> AppResult<Vec<ScopedGrant>> {
        let grants = self.grants.read().await;
        let mut listed: Vec<ScopedGrant> = grants
            .values()
            .filter(|grant| role_id.is_none_or(|wanted| grant.role_id == wanted))
            .cloned()
            .collect();
        listed.sort_by_key(|grant| grant.id);
        Ok(listed)
    }

    async fn list_grants_for_roles(&self, role_ids: &[RoleId]) -> AppResult<Vec<ScopedGrant>> {
        let grants = self.grants.read().await;
        let mut listed: Vec<ScopedGrant> = grants
            .values()
            .filter(|grant| role_ids.contains(&grant.role_id))
            .cloned()
            .collect();
        listed.sort_by_key(|grant| grant.id);
        Ok(listed)
    }

    async fn create_grant(&self, input: GrantInput) -> AppResult<ScopedGrant> {
        let grant = ScopedGrant {
            id: GrantId::new(self.allocate_id())?,
            role_id: input.role_id,
            permission_id: input.permission_id,
            department_id: input.department_id,
            employee_id: input.employee_id,
        };
        self.grants.write().await.insert(grant.id, grant.clone());
        Ok(grant)
    }

    async fn update_grant(&self, grant_id: GrantId, input: GrantInput) -> AppResult<ScopedGrant> {
        let mut grants = self.grants.write().await;
        let Some(grant) = grants.get_mut(&grant_id) else {
            return Err(AppError::NotFound(format!("grant {grant_id}")));
        };
        grant.role_id = input.role_id;
        grant.permission_id = input.permission_id;
        grant.department_id = input.department_id;
        grant.employee_id = input.employee_id;
        Ok(grant.clone())
    }

    async fn soft_delete_grant(&self, grant_id: GrantId) -> AppResult<()> {
        if self.grants.write().await.remove(&grant_id).is_none() {
            return Err(AppError::NotFound(format!("grant {grant_id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl AuditSink for InMemoryRbacRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        let entry = AuditLogEntry {
            entry_id: Uuid::new_v4().to_string(),
            actor_id: event.actor_id,
            action: event.action.as_str().to_owned(),
            target_type: event.target_type,
            target_id: event.target_id,
            detail: event.detail,
            created_at: Utc::now(),
        };
        self.audit_entries.write().await.push(entry);
        Ok(())
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryRbacRepository {
    async fn list_recent_entries(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>> {
        let entries = self.audit_entries.read().await;
        let mut matching: Vec<AuditLogEntry> = entries
            .iter()
            .filter(|entry| {
                query.actor_id.is_none_or(|actor| entry.actor_id == Some(actor))
                    && query.target_id.is_none_or(|target| entry.target_id == target)
            })
            .cloned()
            .collect();
        matching.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit.clamp(1, 200))
            .collect())
    }
}
