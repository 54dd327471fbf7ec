use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use rolegate_application::DepartmentRepository;
use rolegate_core::{AppError, AppResult, DepartmentId, NonEmptyString};
use rolegate_domain::Department;

/// PostgreSQL-backed department repository.
#[derive(Clone)]
pub struct PostgresDepartmentRepository {
    pool: PgPool,
}

impl PostgresDepartmentRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct DepartmentRow {
    id: i64,
    name: String,
}

impl DepartmentRow {
    fn into_department(self) -> AppResult<Department> {
        Ok(Department {
            id: DepartmentId::new(self.id)?,
            name: self.name,
        })
    }
}

#[async_trait]
impl DepartmentRepository for PostgresDepartmentRepository {
    async fn find_department(&self, department_id: DepartmentId) -> AppResult<Option<Department>> {
        let row = sqlx::query_as::<_, DepartmentRow>(
            r#"
            SELECT id, name
            FROM departments
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(department_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::StoreUnavailable(format!("failed to load department: {error}"))
        })?;

        row.map(DepartmentRow::into_department).transpose()
    }

    async fn list_departments(&self) -> AppResult<Vec<Department>> {
        let rows = sqlx::query_as::<_, DepartmentRow>(
            r#"
            SELECT id, name
            FROM departments
            WHERE deleted_at IS NULL
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::StoreUnavailable(format!("failed to list departments: {error}"))
        })?;

        rows.into_iter()
            .map(DepartmentRow::into_department)
            .collect()
    }

    async fn create_department(&self, name: NonEmptyString) -> AppResult<Department> {
        let row = sqlx::query_as::<_, DepartmentRow>(
            r#"
            INSERT INTO departments (name)
            VALUES ($1)
            RETURNING id, name
            "#,
        )
        .bind(name.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::StoreUnavailable(format!("failed to create department: {error}"))
        })?;

        row.into_department()
    }

    async fn update_department(
        &self,
        department_id: DepartmentId,
        name: NonEmptyString,
    ) -> AppResult<Department> {
        let row = sqlx::query_as::<_, DepartmentRow>(
            r#"
            UPDATE departments
            SET name = $2, updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, name
            "#,
        )
        .bind(department_id.as_i64())
        .bind(name.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::StoreUnavailable(format!("failed to update department: {error}"))
        })?;

        row.map(DepartmentRow::into_department)
            .transpose()?
            .ok_or_else(|| AppError::NotFound(format!("department {department_id}")))
    }

    async fn soft_delete_department(&self, department_id: DepartmentId) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE departments
            SET deleted_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(department_id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::StoreUnavailable(format!("failed to delete department: {error}"))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("department {department_id}")));
        }
        Ok(())
    }
}
