//! Employee role assignment management.

use std::collections::HashSet;
use std::sync::Arc;

use rolegate_core::{AppError, AppResult, EmployeeId, RoleId};
use rolegate_domain::{AuditAction, RoleAssignment, RoleForest};
use tracing::info;

use crate::decision_service::DecisionCache;
use crate::rbac_ports::{
    AssignmentRepository, AuditEvent, AuditSink, RoleRepository, record_best_effort,
};

/// Manages (employee, role) assignments. Assignment changes affect only the
/// one employee, so invalidation targets that employee's cache prefix rather
/// than the whole namespace.
pub struct AssignmentService {
    assignments: Arc<dyn AssignmentRepository>,
    roles: Arc<dyn RoleRepository>,
    cache: Arc<DecisionCache>,
    audit: Arc<dyn AuditSink>,
}

impl AssignmentService {
    /// Creates the service over its ports.
    #[must_use]
    pub fn new(
        assignments: Arc<dyn AssignmentRepository>,
        roles: Arc<dyn RoleRepository>,
        cache: Arc<DecisionCache>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            assignments,
            roles,
            cache,
            audit,
        }
    }

    /// Lists an employee's assignments.
    pub async fn list_assignments(&self, employee_id: EmployeeId) -> AppResult<Vec<RoleAssignment>> {
        self.assignments.list_assignments_for_employee(employee_id).await
    }

    /// Assigns a role to an employee. Fails with `Conflict` when the pair
    /// already exists.
    pub async fn assign(&self, employee_id: EmployeeId, role_id: RoleId) -> AppResult<RoleAssignment> {
        self.require_role(role_id).await?;
        let assignment = self.assignments.create_assignment(employee_id, role_id).await?;
        info!(employee_id = %employee_id, role_id = %role_id, "role assigned");
        self.cache.invalidate_employee(employee_id).await;
        self.record(AuditAction::RoleAssigned, employee_id, format!("role {role_id}"))
            .await;
        Ok(assignment)
    }

    /// Moves an employee's assignment from one role to another.
    pub async fn reassign(
        &self,
        employee_id: EmployeeId,
        from_role_id: RoleId,
        to_role_id: RoleId,
    ) -> AppResult<()> {
        self.require_role(to_role_id).await?;
        if self
            .assignments
            .find_assignment(employee_id, from_role_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound(format!(
                "assignment of role {from_role_id} to employee {employee_id}"
            )));
        }

        self.assignments
            .reassign(employee_id, from_role_id, to_role_id)
            .await?;
        info!(employee_id = %employee_id, from = %from_role_id, to = %to_role_id, "role reassigned");
        self.cache.invalidate_employee(employee_id).await;
        self.record(
            AuditAction::RoleReassigned,
            employee_id,
            format!("role {from_role_id} -> {to_role_id}"),
        )
        .await;
        Ok(())
    }

    /// Revokes one assignment.
    pub async fn revoke(&self, employee_id: EmployeeId, role_id: RoleId) -> AppResult<()> {
        if self
            .assignments
            .find_assignment(employee_id, role_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound(format!(
                "assignment of role {role_id} to employee {employee_id}"
            )));
        }

        self.assignments.delete_assignment(employee_id, role_id).await?;
        info!(employee_id = %employee_id, role_id = %role_id, "role unassigned");
        self.cache.invalidate_employee(employee_id).await;
        self.record(AuditAction::RoleUnassigned, employee_id, format!("role {role_id}"))
            .await;
        Ok(())
    }

    /// Assigns many (employee, role) pairs at once. Pairs that already
    /// exist are skipped, so replays are harmless.
    pub async fn bulk_assign(&self, pairs: &[(EmployeeId, RoleId)]) -> AppResult<()> {
        let role_ids: HashSet<RoleId> = pairs.iter().map(|(_, role_id)| *role_id).collect();
        for role_id in &role_ids {
            self.require_role(*role_id).await?;
        }

        for (employee_id, role_id) in pairs {
            self.assignments
                .create_assignment_if_absent(*employee_id, *role_id)
                .await?;
            self.record(
                AuditAction::RoleAssigned,
                *employee_id,
                format!("role {role_id} (bulk)"),
            )
            .await;
        }

        let employees: HashSet<EmployeeId> =
            pairs.iter().map(|(employee_id, _)| *employee_id).collect();
        for employee_id in employees {
            self.cache.invalidate_employee(employee_id).await;
        }
        info!(pairs = pairs.len(), "bulk assignment finished");
        Ok(())
    }

    /// Revokes several of one employee's assignments at once. Absent pairs
    /// are ignored.
    pub async fn bulk_revoke(&self, employee_id: EmployeeId, role_ids: &[RoleId]) -> AppResult<()> {
        if role_ids.is_empty() {
            return Ok(());
        }

        self.assignments.delete_assignments(employee_id, role_ids).await?;
        self.cache.invalidate_employee(employee_id).await;
        let detail = role_ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        info!(employee_id = %employee_id, roles = detail.as_str(), "bulk revocation finished");
        self.record(
            AuditAction::RoleUnassigned,
            employee_id,
            format!("roles {detail} (bulk)"),
        )
        .await;
        Ok(())
    }

    /// Returns the distinct employees whose roles sit at or below any of
    /// the given employee's roles in the hierarchy. The employee itself is
    /// excluded.
    pub async fn subordinate_employee_ids(
        &self,
        employee_id: EmployeeId,
    ) -> AppResult<Vec<EmployeeId>> {
        let own = self
            .assignments
            .list_assignments_for_employee(employee_id)
            .await?;
        if own.is_empty() {
            return Ok(Vec::new());
        }

        let forest = RoleForest::from_roles(&self.roles.list_roles(None).await?);
        let mut subtree: HashSet<RoleId> = HashSet::new();
        for assignment in &own {
            subtree.extend(forest.descendants(assignment.role_id));
        }
        if subtree.is_empty() {
            return Ok(Vec::new());
        }

        let role_ids: Vec<RoleId> = subtree.into_iter().collect();
        let mut employees = self.assignments.list_employees_for_roles(&role_ids).await?;
        employees.retain(|candidate| *candidate != employee_id);
        Ok(employees)
    }

    async fn require_role(&self, role_id: RoleId) -> AppResult<()> {
        self.roles
            .find_role(role_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("role {role_id}")))
    }

    async fn record(&self, action: AuditAction, employee_id: EmployeeId, detail: String) {
        record_best_effort(
            self.audit.as_ref(),
            AuditEvent {
                actor_id: None,
                action,
                target_type: "employee".to_owned(),
                target_id: employee_id.as_i64(),
                detail: Some(detail),
            },
        )
        .await;
    }
}
