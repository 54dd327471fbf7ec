use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use rolegate_application::{CreateRoleInput, RoleRepository, UpdateRoleInput};
use rolegate_core::{AppError, AppResult, DepartmentId, RoleId};
use rolegate_domain::Role;

/// PostgreSQL-backed role repository.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: i64,
    name: String,
    department_id: i64,
    parent_role_id: Option<i64>,
    is_global: bool,
}

impl RoleRow {
    fn into_role(self) -> AppResult<Role> {
        Ok(Role {
            id: RoleId::new(self.id)?,
            name: self.name,
            department_id: DepartmentId::new(self.department_id)?,
            parent_role_id: self.parent_role_id.map(RoleId::new).transpose()?,
            is_global: self.is_global,
        })
    }
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, department_id, parent_role_id, is_global
            FROM roles
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(role_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::StoreUnavailable(format!("failed to load role: {error}")))?;

        row.map(RoleRow::into_role).transpose()
    }

    async fn list_roles(&self, department_id: Option<DepartmentId>) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, department_id, parent_role_id, is_global
            FROM roles
            WHERE deleted_at IS NULL
                AND ($1::BIGINT IS NULL OR department_id = $1)
            ORDER BY id
            "#,
        )
        .bind(department_id.map(|id| id.as_i64()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::StoreUnavailable(format!("failed to list roles: {error}")))?;

        rows.into_iter().map(RoleRow::into_role).collect()
    }

    async fn create_role(&self, input: CreateRoleInput) -> AppResult<Role> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            INSERT INTO roles (name, department_id, parent_role_id, is_global)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, department_id, parent_role_id, is_global
            "#,
        )
        .bind(input.name.as_str())
        .bind(input.department_id.as_i64())
        .bind(input.parent_role_id.map(|id| id.as_i64()))
        .bind(input.is_global)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::StoreUnavailable(format!("failed to create role: {error}")))?;

        row.into_role()
    }

    async fn update_role(&self, role_id: RoleId, input: UpdateRoleInput) -> AppResult<Role> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            UPDATE roles
            SET name = $2,
                department_id = $3,
                parent_role_id = $4,
                is_global = $5,
                updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, name, department_id, parent_role_id, is_global
            "#,
        )
        .bind(role_id.as_i64())
        .bind(input.name.as_str())
        .bind(input.department_id.as_i64())
        .bind(input.parent_role_id.map(|id| id.as_i64()))
        .bind(input.is_global)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::StoreUnavailable(format!("failed to update role: {error}")))?;

        row.map(RoleRow::into_role)
            .transpose()?
            .ok_or_else(|| AppError::NotFound(format!("role {role_id}")))
    }

    async fn soft_delete_role(&self, role_id: RoleId) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE roles
            SET deleted_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(role_id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::StoreUnavailable(format!("failed to delete role: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("role {role_id}")));
        }
        Ok(())
    }
}
