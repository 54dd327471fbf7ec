use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use rolegate_application::{GrantInput, GrantRepository};
use rolegate_core::{AppError, AppResult, DepartmentId, EmployeeId, GrantId, PermissionId, RoleId};
use rolegate_domain::ScopedGrant;

/// PostgreSQL-backed scoped grant repository.
#[derive(Clone)]
pub struct PostgresGrantRepository {
    pool: PgPool,
}

impl PostgresGrantRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct GrantRow {
    id: i64,
    role_id: i64,
    permission_id: i64,
    department_id: Option<i64>,
    employee_id: Option<i64>,
}

impl GrantRow {
    fn into_grant(self) -> AppResult<ScopedGrant> {
        Ok(ScopedGrant {
            id: GrantId::new(self.id)?,
            role_id: RoleId::new(self.role_id)?,
            permission_id: PermissionId::new(self.permission_id)?,
            department_id: self.department_id.map(DepartmentId::new).transpose()?,
            employee_id: self.employee_id.map(EmployeeId::new).transpose()?,
        })
    }
}

#[async_trait]
impl GrantRepository for PostgresGrantRepository {
    async fn find_grant(&self, grant_id: GrantId) -> AppResult<Option<ScopedGrant>> {
        let row = sqlx::query_as::<_, GrantRow>(
            r#"
            SELECT id, role_id, permission_id, department_id, employee_id
            FROM scoped_permission_grants
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(grant_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::StoreUnavailable(format!("failed to load grant: {error}")))?;

        row.map(GrantRow::into_grant).transpose()
    }

    async fn list_grants(&self, role_id: Option<RoleId>) -> AppResult<Vec<ScopedGrant>> {
        let rows = sqlx::query_as::<_, GrantRow>(
            r#"
            SELECT id, role_id, permission_id, department_id, employee_id
            FROM scoped_permission_grants
            WHERE deleted_at IS NULL
                AND ($1::BIGINT IS NULL OR role_id = $1)
            ORDER BY id
            "#,
        )
        .bind(role_id.map(|id| id.as_i64()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::StoreUnavailable(format!("failed to list grants: {error}")))?;

        rows.into_iter().map(GrantRow::into_grant).collect()
    }

    async fn list_grants_for_roles(&self, role_ids: &[RoleId]) -> AppResult<Vec<ScopedGrant>> {
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = role_ids.iter().map(RoleId::as_i64).collect();
        let rows = sqlx::query_as::<_, GrantRow>(
            r#"
            SELECT id, role_id, permission_id, department_id, employee_id
            FROM scoped_permission_grants
            WHERE role_id = ANY($1) AND deleted_at IS NULL
            ORDER BY id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::StoreUnavailable(format!("failed to list grants: {error}")))?;

        rows.into_iter().map(GrantRow::into_grant).collect()
    }

    async fn create_grant(&self, input: GrantInput) -> AppResult<ScopedGrant> {
        let row = sqlx::query_as::<_, GrantRow>(
            r#"
            INSERT INTO scoped_permission_grants (
                role_id,
                permission_id,
                department_id,
                employee_id
            )
            VALUES ($1, $2, $3, $4)
            RETURNING id, role_id, permission_id, department_id, employee_id
            "#,
        )
        .bind(input.role_id.as_i64())
        .bind(input.permission_id.as_i64())
        .bind(input.department_id.map(|id| id.as_i64()))
        .bind(input.employee_id.map(|id| id.as_i64()))
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::StoreUnavailable(format!("failed to create grant: {error}")))?;

        row.into_grant()
    }

    async fn update_grant(&self, grant_id: GrantId, input: GrantInput) -> AppResult<ScopedGrant> {
        let row = sqlx::query_as::<_, GrantRow>(
            r#"
            UPDATE scoped_permission_grants
            SET role_id = $2,
                permission_id = $3,
                department_id = $4,
                employee_id = $5,
                updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, role_id, permission_id, department_id, employee_id
            "#,
        )
        .bind(grant_id.as_i64())
        .bind(input.role_id.as_i64())
        .bind(input.permission_id.as_i64())
        .bind(input.department_id.map(|id| id.as_i64()))
        .bind(input.employee_id.map(|id| id.as_i64()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::StoreUnavailable(format!("failed to update grant: {error}")))?;

        row.map(GrantRow::into_grant)
            .transpose()?
            .ok_or_else(|| AppError::NotFound(format!("grant {grant_id}")))
    }

    async fn soft_delete_grant(&self, grant_id: GrantId) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE scoped_permission_grants
            SET deleted_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(grant_id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::StoreUnavailable(format!("failed to delete grant: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("grant {grant_id}")));
        }
        Ok(())
    }
}
