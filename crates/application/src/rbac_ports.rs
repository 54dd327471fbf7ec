//! Ports consumed by the application services: repositories over the five
//! persisted entity tables, the key-value cache backend, and the audit sink.

mod assignments;
mod audit;
mod cache;
mod catalog;
mod grants;
mod roles;

pub use assignments::AssignmentRepository;
pub use audit::{AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository, AuditSink};
pub use cache::KeyValueCache;
pub use catalog::{DepartmentRepository, PermissionRepository};
pub use grants::{GrantInput, GrantRepository};
pub use roles::{CreateRoleInput, RoleRepository, UpdateRoleInput};

pub(crate) use audit::record_best_effort;
