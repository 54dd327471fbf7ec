use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use rolegate_application::AssignmentRepository;
use rolegate_core::{AppError, AppResult, EmployeeId, RoleId};
use rolegate_domain::RoleAssignment;

/// PostgreSQL-backed (employee, role) assignment repository. Uniqueness of
/// the live pair rests on a partial unique index over rows where
/// `deleted_at IS NULL`.
#[derive(Clone)]
pub struct PostgresAssignmentRepository {
    pool: PgPool,
}

impl PostgresAssignmentRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    employee_id: i64,
    role_id: i64,
    assigned_at: DateTime<Utc>,
}

impl AssignmentRow {
    fn into_assignment(self) -> AppResult<RoleAssignment> {
        Ok(RoleAssignment {
            employee_id: EmployeeId::new(self.employee_id)?,
            role_id: RoleId::new(self.role_id)?,
            assigned_at: self.assigned_at,
        })
    }
}

#[async_trait]
impl AssignmentRepository for PostgresAssignmentRepository {
    async fn list_assignments_for_employee(
        &self,
        employee_id: EmployeeId,
    ) -> AppResult<Vec<RoleAssignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT employee_id, role_id, assigned_at
            FROM employee_role_assignments
            WHERE employee_id = $1 AND deleted_at IS NULL
            ORDER BY role_id
            "#,
        )
        .bind(employee_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::StoreUnavailable(format!("failed to list assignments: {error}"))
        })?;

        rows.into_iter()
            .map(AssignmentRow::into_assignment)
            .collect()
    }

    async fn list_assignments_for_employees(
        &self,
        employee_ids: &[EmployeeId],
    ) -> AppResult<Vec<RoleAssignment>> {
        if employee_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = employee_ids.iter().map(EmployeeId::as_i64).collect();
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT employee_id, role_id, assigned_at
            FROM employee_role_assignments
            WHERE employee_id = ANY($1) AND deleted_at IS NULL
            ORDER BY employee_id, role_id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::StoreUnavailable(format!("failed to list assignments: {error}"))
        })?;

        rows.into_iter()
            .map(AssignmentRow::into_assignment)
            .collect()
    }

    async fn find_assignment(
        &self,
        employee_id: EmployeeId,
        role_id: RoleId,
    ) -> AppResult<Option<RoleAssignment>> {
        let row = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT employee_id, role_id, assigned_at
            FROM employee_role_assignments
            WHERE employee_id = $1 AND role_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(employee_id.as_i64())
        .bind(role_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::StoreUnavailable(format!("failed to load assignment: {error}"))
        })?;

        row.map(AssignmentRow::into_assignment).transpose()
    }

    async fn create_assignment(
        &self,
        employee_id: EmployeeId,
        role_id: RoleId,
    ) -> AppResult<RoleAssignment> {
        let row = sqlx::query_as::<_, AssignmentRow>(
            r#"
            INSERT INTO employee_role_assignments (employee_id, role_id)
            VALUES ($1, $2)
            RETURNING employee_id, role_id, assigned_at
            "#,
        )
        .bind(employee_id.as_i64())
        .bind(role_id.as_i64())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            if error
                .as_database_error()
                .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
            {
                return AppError::Conflict(format!(
                    "employee {employee_id} already holds role {role_id}"
                ));
            }
            AppError::StoreUnavailable(format!("failed to create assignment: {error}"))
        })?;

        row.into_assignment()
    }

    async fn create_assignment_if_absent(
        &self,
        employee_id: EmployeeId,
        role_id: RoleId,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO employee_role_assignments (employee_id, role_id)
            VALUES ($1, $2)
            ON CONFLICT (employee_id, role_id) WHERE deleted_at IS NULL
            DO NOTHING
            "#,
        )
        .bind(employee_id.as_i64())
        .bind(role_id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::StoreUnavailable(format!("failed to create assignment: {error}"))
        })?;

        Ok(())
    }

    async fn reassign(
        &self,
        employee_id: EmployeeId,
        from_role_id: RoleId,
        to_role_id: RoleId,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE employee_role_assignments
            SET role_id = $3, assigned_at = now()
            WHERE employee_id = $1 AND role_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(employee_id.as_i64())
        .bind(from_role_id.as_i64())
        .bind(to_role_id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::StoreUnavailable(format!("failed to reassign role: {error}"))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "assignment of role {from_role_id} to employee {employee_id}"
            )));
        }
        Ok(())
    }

    async fn delete_assignment(&self, employee_id: EmployeeId, role_id: RoleId) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE employee_role_assignments
            SET deleted_at = now()
            WHERE employee_id = $1 AND role_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(employee_id.as_i64())
        .bind(role_id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::StoreUnavailable(format!("failed to delete assignment: {error}"))
        })?;

        if result.rows_affected() == 0 {
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
        if role_ids.is_empty() {
            return Ok(());
        }

        let ids: Vec<i64> = role_ids.iter().map(RoleId::as_i64).collect();
        sqlx::query(
            r#"
            UPDATE employee_role_assignments
            SET deleted_at = now()
            WHERE employee_id = $1 AND role_id = ANY($2) AND deleted_at IS NULL
            "#,
        )
        .bind(employee_id.as_i64())
        .bind(&ids)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::StoreUnavailable(format!("failed to delete assignments: {error}"))
        })?;

        Ok(())
    }

    async fn list_employees_for_roles(&self, role_ids: &[RoleId]) -> AppResult<Vec<EmployeeId>> {
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = role_ids.iter().map(RoleId::as_i64).collect();
        let employee_ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT employee_id
            FROM employee_role_assignments
            WHERE role_id = ANY($1) AND deleted_at IS NULL
            ORDER BY employee_id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::StoreUnavailable(format!("failed to list role holders: {error}"))
        })?;

        employee_ids.into_iter().map(EmployeeId::new).collect()
    }
}
