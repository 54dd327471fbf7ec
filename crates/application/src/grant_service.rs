//! Scoped grant management.

use std::sync::Arc;

use rolegate_core::{AppError, AppResult, GrantId, RoleId};
use rolegate_domain::{AuditAction, ScopedGrant};
use tracing::info;

use crate::decision_service::DecisionCache;
use crate::rbac_ports::{
    AuditEvent, AuditSink, DepartmentRepository, GrantInput, GrantRepository,
    PermissionRepository, RoleRepository, record_best_effort,
};

/// CRUD over scoped grants. Grants attach to roles, so any mutation can
/// change the verdict of any employee below that role; every mutation clears
/// the whole decision-cache namespace.
pub struct GrantService {
    grants: Arc<dyn GrantRepository>,
    roles: Arc<dyn RoleRepository>,
    permissions: Arc<dyn PermissionRepository>,
    departments: Arc<dyn DepartmentRepository>,
    cache: Arc<DecisionCache>,
    audit: Arc<dyn AuditSink>,
}

impl GrantService {
    /// Creates the service over its ports.
    #[must_use]
    pub fn new(
        grants: Arc<dyn GrantRepository>,
        roles: Arc<dyn RoleRepository>,
        permissions: Arc<dyn PermissionRepository>,
        departments: Arc<dyn DepartmentRepository>,
        cache: Arc<DecisionCache>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            grants,
            roles,
            permissions,
            departments,
            cache,
            audit,
        }
    }

    /// Returns a grant by id.
    pub async fn get_grant(&self, grant_id: GrantId) -> AppResult<ScopedGrant> {
        self.grants
            .find_grant(grant_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("grant {grant_id}")))
    }

    /// Lists live grants, optionally filtered by role.
    pub async fn list_grants(&self, role_id: Option<RoleId>) -> AppResult<Vec<ScopedGrant>> {
        self.grants.list_grants(role_id).await
    }

    /// Lists the grants attached directly to one role.
    pub async fn grants_for_role(&self, role_id: RoleId) -> AppResult<Vec<ScopedGrant>> {
        self.grants.list_grants(Some(role_id)).await
    }

    /// Attaches a permission to a role, optionally restricted to one
    /// department and/or one target employee.
    pub async fn add_grant(&self, input: GrantInput) -> AppResult<ScopedGrant> {
        self.validate_references(&input).await?;
        let grant = self.grants.create_grant(input).await?;
        info!(grant_id = %grant.id, role_id = %grant.role_id, "grant added");
        self.cache.invalidate_all().await;
        self.record(AuditAction::GrantAdded, &grant).await;
        Ok(grant)
    }

    /// Replaces a grant's role, permission, and restriction axes.
    pub async fn update_grant(&self, grant_id: GrantId, input: GrantInput) -> AppResult<ScopedGrant> {
        self.get_grant(grant_id).await?;
        self.validate_references(&input).await?;
        let grant = self.grants.update_grant(grant_id, input).await?;
        info!(grant_id = %grant.id, role_id = %grant.role_id, "grant updated");
        self.cache.invalidate_all().await;
        self.record(AuditAction::GrantUpdated, &grant).await;
        Ok(grant)
    }

    /// Soft-deletes a grant. Its audit entries remain.
    pub async fn remove_grant(&self, grant_id: GrantId) -> AppResult<()> {
        let grant = self.get_grant(grant_id).await?;
        self.grants.soft_delete_grant(grant_id).await?;
        info!(grant_id = %grant_id, "grant removed");
        self.cache.invalidate_all().await;
        self.record(AuditAction::GrantRemoved, &grant).await;
        Ok(())
    }

    async fn validate_references(&self, input: &GrantInput) -> AppResult<()> {
        if self.roles.find_role(input.role_id).await?.is_none() {
            return Err(AppError::NotFound(format!("role {}", input.role_id)));
        }
        if self
            .permissions
            .find_permission(input.permission_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound(format!(
                "permission {}",
                input.permission_id
            )));
        }
        if let Some(department_id) = input.department_id {
            if self
                .departments
                .find_department(department_id)
                .await?
                .is_none()
            {
                return Err(AppError::NotFound(format!("department {department_id}")));
            }
        }
        Ok(())
    }

    async fn record(&self, action: AuditAction, grant: &ScopedGrant) {
        record_best_effort(
            self.audit.as_ref(),
            AuditEvent {
                actor_id: None,
                action,
                target_type: "grant".to_owned(),
                target_id: grant.id.as_i64(),
                detail: Some(format!(
                    "role {} permission {}",
                    grant.role_id, grant.permission_id
                )),
            },
        )
        .await;
    }
}
