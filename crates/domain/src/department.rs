use rolegate_core::DepartmentId;
use serde::{Deserialize, Serialize};

/// A logical group of roles, e.g. Sales or HR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    /// Stable department identifier.
    pub id: DepartmentId,
    /// Unique department name.
    pub name: String,
}
