//! Domain entities and invariants for the Rolegate access-control engine.

#![forbid(unsafe_code)]

mod audit;
mod decision;
mod department;
mod grant;
mod hierarchy;
mod permission;
mod role;

pub use audit::AuditAction;
pub use decision::Verdict;
pub use department::Department;
pub use grant::ScopedGrant;
pub use hierarchy::RoleForest;
pub use permission::Permission;
pub use role::{Role, RoleAssignment};
