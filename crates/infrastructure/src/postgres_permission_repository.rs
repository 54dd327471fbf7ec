use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use rolegate_application::PermissionRepository;
use rolegate_core::{AppError, AppResult, NonEmptyString, PermissionId};
use rolegate_domain::Permission;

/// PostgreSQL-backed permission catalog repository.
#[derive(Clone)]
pub struct PostgresPermissionRepository {
    pool: PgPool,
}

impl PostgresPermissionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    id: i64,
    name: String,
    is_global: bool,
}

impl PermissionRow {
    fn into_permission(self) -> AppResult<Permission> {
        Ok(Permission {
            id: PermissionId::new(self.id)?,
            name: self.name,
            is_global: self.is_global,
        })
    }
}

#[async_trait]
impl PermissionRepository for PostgresPermissionRepository {
    async fn find_permission(&self, permission_id: PermissionId) -> AppResult<Option<Permission>> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, name, is_global
            FROM permissions
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(permission_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::StoreUnavailable(format!("failed to load permission: {error}"))
        })?;

        row.map(PermissionRow::into_permission).transpose()
    }

    async fn find_permission_by_name(&self, name: &str) -> AppResult<Option<Permission>> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, name, is_global
            FROM permissions
            WHERE name = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::StoreUnavailable(format!("failed to load permission by name: {error}"))
        })?;

        row.map(PermissionRow::into_permission).transpose()
    }

    async fn find_permissions_by_ids(
        &self,
        permission_ids: &[PermissionId],
    ) -> AppResult<Vec<Permission>> {
        if permission_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = permission_ids.iter().map(PermissionId::as_i64).collect();
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, name, is_global
            FROM permissions
            WHERE id = ANY($1) AND deleted_at IS NULL
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::StoreUnavailable(format!("failed to load permissions: {error}"))
        })?;

        rows.into_iter()
            .map(PermissionRow::into_permission)
            .collect()
    }

    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, name, is_global
            FROM permissions
            WHERE deleted_at IS NULL
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::StoreUnavailable(format!("failed to list permissions: {error}"))
        })?;

        rows.into_iter()
            .map(PermissionRow::into_permission)
            .collect()
    }

    async fn create_permission(
        &self,
        name: NonEmptyString,
        is_global: bool,
    ) -> AppResult<Permission> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            INSERT INTO permissions (name, is_global)
            VALUES ($1, $2)
            RETURNING id, name, is_global
            "#,
        )
        .bind(name.as_str())
        .bind(is_global)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            if error
                .as_database_error()
                .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
            {
                return AppError::Conflict(format!("permission '{}' already exists", name.as_str()));
            }
            AppError::StoreUnavailable(format!("failed to create permission: {error}"))
        })?;

        row.into_permission()
    }

    async fn update_permission(
        &self,
        permission_id: PermissionId,
        name: NonEmptyString,
        is_global: bool,
    ) -> AppResult<Permission> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            UPDATE permissions
            SET name = $2, is_global = $3, updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, name, is_global
            "#,
        )
        .bind(permission_id.as_i64())
        .bind(name.as_str())
        .bind(is_global)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::StoreUnavailable(format!("failed to update permission: {error}"))
        })?;

        row.map(PermissionRow::into_permission)
            .transpose()?
            .ok_or_else(|| AppError::NotFound(format!("permission {permission_id}")))
    }

    async fn soft_delete_permission(&self, permission_id: PermissionId) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE permissions
            SET deleted_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(permission_id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::StoreUnavailable(format!("failed to delete permission: {error}"))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("permission {permission_id}")));
        }
        Ok(())
    }
}
