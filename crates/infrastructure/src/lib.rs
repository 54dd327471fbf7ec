//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_key_value_cache;
mod in_memory_rbac_repository;
mod postgres_assignment_repository;
mod postgres_audit_repository;
mod postgres_department_repository;
mod postgres_grant_repository;
mod postgres_permission_repository;
mod postgres_role_repository;
mod redis_decision_cache;

pub use in_memory_key_value_cache::InMemoryKeyValueCache;
pub use in_memory_rbac_repository::InMemoryRbacRepository;
pub use postgres_assignment_repository::PostgresAssignmentRepository;
pub use postgres_audit_repository::{PostgresAuditLogRepository, PostgresAuditRepository};
pub use postgres_department_repository::PostgresDepartmentRepository;
pub use postgres_grant_repository::PostgresGrantRepository;
pub use postgres_permission_repository::PostgresPermissionRepository;
pub use postgres_role_repository::PostgresRoleRepository;
pub use redis_decision_cache::RedisDecisionCache;
