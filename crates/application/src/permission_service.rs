//! Permission catalog administration.

use std::sync::Arc;

use rolegate_core::{AppError, AppResult, NonEmptyString, PermissionId};
use rolegate_domain::{AuditAction, Permission};
use tracing::info;

use crate::decision_service::DecisionCache;
use crate::rbac_ports::{AuditEvent, AuditSink, PermissionRepository, record_best_effort};

/// CRUD over the permission catalog. Every mutation clears the whole
/// decision-cache namespace, since cached verdicts key on permission names.
pub struct PermissionService {
    permissions: Arc<dyn PermissionRepository>,
    cache: Arc<DecisionCache>,
    audit: Arc<dyn AuditSink>,
}

impl PermissionService {
    /// Creates the service over its ports.
    #[must_use]
    pub fn new(
        permissions: Arc<dyn PermissionRepository>,
        cache: Arc<DecisionCache>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            permissions,
            cache,
            audit,
        }
    }

    /// Returns a permission by id.
    pub async fn get_permission(&self, permission_id: PermissionId) -> AppResult<Permission> {
        self.permissions
            .find_permission(permission_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("permission {permission_id}")))
    }

    /// Lists live permissions.
    pub async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        self.permissions.list_permissions().await
    }

    /// Creates a permission.
    pub async fn create_permission(&self, name: &str, is_global: bool) -> AppResult<Permission> {
        let name = NonEmptyString::new(name)?;
        let permission = self.permissions.create_permission(name, is_global).await?;
        info!(permission_id = %permission.id, name = permission.name.as_str(), "permission created");
        self.cache.invalidate_all().await;
        self.record(AuditAction::PermissionCreated, &permission).await;
        Ok(permission)
    }

    /// Updates a permission's name and global hint.
    pub async fn update_permission(
        &self,
        permission_id: PermissionId,
        name: &str,
        is_global: bool,
    ) -> AppResult<Permission> {
        let name = NonEmptyString::new(name)?;
        self.get_permission(permission_id).await?;
        let permission = self
            .permissions
            .update_permission(permission_id, name, is_global)
            .await?;
        info!(permission_id = %permission.id, "permission updated");
        self.cache.invalidate_all().await;
        self.record(AuditAction::PermissionUpdated, &permission).await;
        Ok(permission)
    }

    /// Soft-deletes a permission. Its audit entries remain.
    pub async fn delete_permission(&self, permission_id: PermissionId) -> AppResult<()> {
        let permission = self.get_permission(permission_id).await?;
        self.permissions.soft_delete_permission(permission_id).await?;
        info!(permission_id = %permission_id, "permission deleted");
        self.cache.invalidate_all().await;
        self.record(AuditAction::PermissionDeleted, &permission).await;
        Ok(())
    }

    async fn record(&self, action: AuditAction, permission: &Permission) {
        record_best_effort(
            self.audit.as_ref(),
            AuditEvent {
                actor_id: None,
                action,
                target_type: "permission".to_owned(),
                target_id: permission.id.as_i64(),
                detail: Some(permission.name.clone()),
            },
        )
        .await;
    }
}
