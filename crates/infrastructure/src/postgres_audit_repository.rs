use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use rolegate_application::{AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository, AuditSink};
use rolegate_core::{AppError, AppResult, EmployeeId};

/// PostgreSQL-backed append-only audit sink.
#[derive(Clone)]
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PostgresAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_log_entries (
                id,
                actor_id,
                action,
                target_type,
                target_id,
                detail
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event.actor_id.map(|id| id.as_i64()))
        .bind(event.action.as_str())
        .bind(event.target_type)
        .bind(event.target_id)
        .bind(event.detail)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::StoreUnavailable(format!("failed to append audit event: {error}"))
        })?;

        Ok(())
    }
}

/// PostgreSQL-backed repository for audit log read models. Entries are kept
/// even after the entities they reference are soft-deleted.
#[derive(Clone)]
pub struct PostgresAuditLogRepository {
    pool: PgPool,
}

impl PostgresAuditLogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditLogRow {
    id: Uuid,
    actor_id: Option<i64>,
    action: String,
    target_type: String,
    target_id: i64,
    detail: Option<String>,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl AuditLogRepository for PostgresAuditLogRepository {
    async fn list_recent_entries(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>> {
        let capped_limit = query.limit.clamp(1, 200) as i64;
        let capped_offset = query.offset.min(5_000) as i64;
        let rows = sqlx::query_as::<_, AuditLogRow>(
            r#"
            SELECT id, actor_id, action, target_type, target_id, detail, created_at
            FROM audit_log_entries
            WHERE ($1::BIGINT IS NULL OR actor_id = $1)
                AND ($2::BIGINT IS NULL OR target_id = $2)
            ORDER BY created_at DESC
            LIMIT $3
            OFFSET $4
            "#,
        )
        .bind(query.actor_id.map(|id| id.as_i64()))
        .bind(query.target_id)
        .bind(capped_limit)
        .bind(capped_offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::StoreUnavailable(format!("failed to list audit log entries: {error}"))
        })?;

        rows.into_iter()
            .map(|row| {
                Ok(AuditLogEntry {
                    entry_id: row.id.to_string(),
                    actor_id: row.actor_id.map(EmployeeId::new).transpose()?,
                    action: row.action,
                    target_type: row.target_type,
                    target_id: row.target_id,
                    detail: row.detail,
                    created_at: row.created_at,
                })
            })
            .collect()
    }
}
