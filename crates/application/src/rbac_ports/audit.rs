use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rolegate_core::{AppResult, EmployeeId};
use rolegate_domain::AuditAction;
use tracing::warn;

/// Immutable audit event payload emitted by mutations and resolutions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Acting employee; `None` for administrative/system actions.
    pub actor_id: Option<EmployeeId>,
    /// Stable audit action identifier.
    pub action: AuditAction,
    /// Target entity type label.
    pub target_type: String,
    /// Target entity identifier.
    pub target_id: i64,
    /// Optional human-readable detail.
    pub detail: Option<String>,
}

/// Port for persisting append-only audit events.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Persists one audit event.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}

/// Audit log entry projection returned by the read port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogEntry {
    /// Stable entry identifier.
    pub entry_id: String,
    /// Acting employee; `None` for administrative/system actions.
    pub actor_id: Option<EmployeeId>,
    /// Stable action identifier, as stored.
    pub action: String,
    /// Target entity type label.
    pub target_type: String,
    /// Target entity identifier.
    pub target_id: i64,
    /// Optional detail payload.
    pub detail: Option<String>,
    /// Entry timestamp.
    pub created_at: DateTime<Utc>,
}

/// Query parameters for audit log listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogQuery {
    /// Maximum rows returned.
    pub limit: usize,
    /// Rows skipped for offset pagination.
    pub offset: usize,
    /// Optional actor filter.
    pub actor_id: Option<EmployeeId>,
    /// Optional target filter.
    pub target_id: Option<i64>,
}

/// Port for reading recent audit entries. Entries survive soft deletion of
/// the entities they reference.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Lists most recent entries, newest first.
    async fn list_recent_entries(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>>;
}

/// Appends an audit event, absorbing any sink failure. Audit is best-effort
/// and must never fail the triggering mutation or resolution.
pub(crate) async fn record_best_effort(sink: &dyn AuditSink, event: AuditEvent) {
    let action = event.action;
    if let Err(error) = sink.append_event(event).await {
        warn!(action = action.as_str(), error = %error, "failed to append audit event");
    }
}
