//! Role hierarchy administration and traversal.

use std::collections::HashMap;
use std::sync::Arc;

use rolegate_core::{AppError, AppResult, DepartmentId, RoleId};
use rolegate_domain::{AuditAction, Role, RoleForest};
use tracing::info;

use crate::decision_service::DecisionCache;
use crate::rbac_ports::{
    AuditEvent, AuditSink, CreateRoleInput, DepartmentRepository, RoleRepository, UpdateRoleInput,
    record_best_effort,
};

/// CRUD and traversal over the role forest. Writes that set or change a
/// parent are cycle-checked against a snapshot of the live hierarchy before
/// they reach the store. Every mutation clears the whole decision-cache
/// namespace, since inherited grants can reach any employee.
pub struct RoleHierarchyService {
    roles: Arc<dyn RoleRepository>,
    departments: Arc<dyn DepartmentRepository>,
    cache: Arc<DecisionCache>,
    audit: Arc<dyn AuditSink>,
}

impl RoleHierarchyService {
    /// Creates the service over its ports.
    #[must_use]
    pub fn new(
        roles: Arc<dyn RoleRepository>,
        departments: Arc<dyn DepartmentRepository>,
        cache: Arc<DecisionCache>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            roles,
            departments,
            cache,
            audit,
        }
    }

    /// Returns a role by id.
    pub async fn get_role(&self, role_id: RoleId) -> AppResult<Role> {
        self.roles
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role {role_id}")))
    }

    /// Lists live roles, optionally filtered by department.
    pub async fn list_roles(&self, department_id: Option<DepartmentId>) -> AppResult<Vec<Role>> {
        self.roles.list_roles(department_id).await
    }

    /// Returns a role's direct children.
    pub async fn get_children(&self, role_id: RoleId) -> AppResult<Vec<Role>> {
        let snapshot = self.live_snapshot().await?;
        if !snapshot.forest.contains(role_id) {
            return Err(AppError::NotFound(format!("role {role_id}")));
        }
        Ok(snapshot.resolve(snapshot.forest.children(role_id)))
    }

    /// Returns the transitive closure of a role's children, the role itself
    /// included.
    pub async fn get_descendants(&self, role_id: RoleId) -> AppResult<Vec<Role>> {
        let snapshot = self.live_snapshot().await?;
        if !snapshot.forest.contains(role_id) {
            return Err(AppError::NotFound(format!("role {role_id}")));
        }
        Ok(snapshot.resolve(&snapshot.forest.descendants(role_id)))
    }

    /// Returns the chain self, parent, …, root.
    pub async fn get_ancestor_chain(&self, role_id: RoleId) -> AppResult<Vec<Role>> {
        let snapshot = self.live_snapshot().await?;
        if !snapshot.forest.contains(role_id) {
            return Err(AppError::NotFound(format!("role {role_id}")));
        }
        Ok(snapshot.resolve(&snapshot.forest.ancestor_chain(role_id)))
    }

    /// Creates a role under an existing department and, optionally, an
    /// existing parent. A brand-new role cannot close a cycle, so only
    /// referential existence is checked here.
    pub async fn create_role(&self, input: CreateRoleInput) -> AppResult<Role> {
        self.require_department(input.department_id).await?;
        if let Some(parent_id) = input.parent_role_id {
            self.get_role(parent_id).await?;
        }

        let role = self.roles.create_role(input).await?;
        info!(role_id = %role.id, parent = ?role.parent_role_id, "role created");
        self.cache.invalidate_all().await;
        self.record(AuditAction::RoleCreated, &role).await;
        Ok(role)
    }

    /// Updates a role. A parent change is rejected with `CycleDetected`
    /// when the role's own id appears on the proposed parent's ancestor
    /// chain.
    pub async fn update_role(&self, role_id: RoleId, input: UpdateRoleInput) -> AppResult<Role> {
        self.get_role(role_id).await?;
        self.require_department(input.department_id).await?;
        if let Some(parent_id) = input.parent_role_id {
            self.get_role(parent_id).await?;
            let snapshot = self.live_snapshot().await?;
            if snapshot.forest.would_create_cycle(role_id, parent_id) {
                return Err(AppError::CycleDetected(format!(
                    "role {role_id} cannot be parented under {parent_id}"
                )));
            }
        }

        let role = self.roles.update_role(role_id, input).await?;
        info!(role_id = %role.id, parent = ?role.parent_role_id, "role updated");
        self.cache.invalidate_all().await;
        self.record(AuditAction::RoleUpdated, &role).await;
        Ok(role)
    }

    /// Soft-deletes a role. Children referencing it become roots of their
    /// own subtrees on the next hierarchy snapshot.
    pub async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        let role = self.get_role(role_id).await?;
        self.roles.soft_delete_role(role_id).await?;
        info!(role_id = %role_id, "role deleted");
        self.cache.invalidate_all().await;
        self.record(AuditAction::RoleDeleted, &role).await;
        Ok(())
    }

    async fn live_snapshot(&self) -> AppResult<HierarchySnapshot> {
        let roles = self.roles.list_roles(None).await?;
        let forest = RoleForest::from_roles(&roles);
        let by_id = roles.into_iter().map(|role| (role.id, role)).collect();
        Ok(HierarchySnapshot { forest, by_id })
    }

    async fn require_department(&self, department_id: DepartmentId) -> AppResult<()> {
        self.departments
            .find_department(department_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("department {department_id}")))
    }

    async fn record(&self, action: AuditAction, role: &Role) {
        record_best_effort(
            self.audit.as_ref(),
            AuditEvent {
                actor_id: None,
                action,
                target_type: "role".to_owned(),
                target_id: role.id.as_i64(),
                detail: Some(role.name.clone()),
            },
        )
        .await;
    }
}

struct HierarchySnapshot {
    forest: RoleForest,
    by_id: HashMap<RoleId, Role>,
}

impl HierarchySnapshot {
    fn resolve(&self, role_ids: &[RoleId]) -> Vec<Role> {
        role_ids
            .iter()
            .filter_map(|role_id| self.by_id.get(role_id).cloned())
            .collect()
    }
}
