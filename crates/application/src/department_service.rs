//! Department administration.

use std::sync::Arc;

use rolegate_core::{AppError, AppResult, DepartmentId, NonEmptyString};
use rolegate_domain::{AuditAction, Department};
use tracing::info;

use crate::rbac_ports::{AuditEvent, AuditSink, DepartmentRepository, record_best_effort};

/// CRUD over departments. Department changes do not touch the decision
/// cache: cached verdicts key on department ids, which stay valid across
/// renames, and grants scoped to a deleted department simply stop matching
/// new checks as their entries expire.
pub struct DepartmentService {
    departments: Arc<dyn DepartmentRepository>,
    audit: Arc<dyn AuditSink>,
}

impl DepartmentService {
    /// Creates the service over its ports.
    #[must_use]
    pub fn new(departments: Arc<dyn DepartmentRepository>, audit: Arc<dyn AuditSink>) -> Self {
        Self { departments, audit }
    }

    /// Returns a department by id.
    pub async fn get_department(&self, department_id: DepartmentId) -> AppResult<Department> {
        self.departments
            .find_department(department_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("department {department_id}")))
    }

    /// Lists live departments.
    pub async fn list_departments(&self) -> AppResult<Vec<Department>> {
        self.departments.list_departments().await
    }

    /// Creates a department.
    pub async fn create_department(&self, name: &str) -> AppResult<Department> {
        let name = NonEmptyString::new(name)?;
        let department = self.departments.create_department(name).await?;
        info!(department_id = %department.id, "department created");
        self.record(AuditAction::DepartmentCreated, &department).await;
        Ok(department)
    }

    /// Renames a department.
    pub async fn update_department(
        &self,
        department_id: DepartmentId,
        name: &str,
    ) -> AppResult<Department> {
        let name = NonEmptyString::new(name)?;
        self.get_department(department_id).await?;
        let department = self
            .departments
            .update_department(department_id, name)
            .await?;
        info!(department_id = %department.id, "department updated");
        self.record(AuditAction::DepartmentUpdated, &department).await;
        Ok(department)
    }

    /// Soft-deletes a department. Its audit entries remain.
    pub async fn delete_department(&self, department_id: DepartmentId) -> AppResult<()> {
        let department = self.get_department(department_id).await?;
        self.departments.soft_delete_department(department_id).await?;
        info!(department_id = %department_id, "department deleted");
        self.record(AuditAction::DepartmentDeleted, &department).await;
        Ok(())
    }

    async fn record(&self, action: AuditAction, department: &Department) {
        record_best_effort(
            self.audit.as_ref(),
            AuditEvent {
                actor_id: None,
                action,
                target_type: "department".to_owned(),
                target_id: department.id.as_i64(),
                detail: Some(department.name.clone()),
            },
        )
        .await;
    }
}
