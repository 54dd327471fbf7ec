//! Application services for the access-control engine.
//!
//! Each service orchestrates the domain model through the ports in
//! [`rbac_ports`]: catalog and hierarchy administration, assignment and
//! grant management, and the permission resolver with its decision cache.

#![forbid(unsafe_code)]

pub mod assignment_service;
pub mod decision_service;
pub mod department_service;
pub mod grant_service;
pub mod permission_service;
pub mod rbac_ports;
pub mod role_hierarchy_service;

pub use assignment_service::AssignmentService;
pub use decision_service::{
    BulkCheckResult, CacheMetrics, CacheMetricsSnapshot, CheckRequest, DecisionCache,
    DecisionService,
};
pub use department_service::DepartmentService;
pub use grant_service::GrantService;
pub use permission_service::PermissionService;
pub use rbac_ports::{
    AssignmentRepository, AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository, AuditSink,
    CreateRoleInput, DepartmentRepository, GrantInput, GrantRepository, KeyValueCache,
    PermissionRepository, RoleRepository, UpdateRoleInput,
};
pub use role_hierarchy_service::RoleHierarchyService;
