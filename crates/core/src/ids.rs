//! Identifier newtypes for the five persisted entity tables.
//!
//! Every identifier is a positive 64-bit integer. Zero and negative values
//! are rejected at construction so services never see them.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult};

fn positive(value: i64, label: &str) -> AppResult<i64> {
    if value <= 0 {
        return Err(AppError::Validation(format!(
            "{label} must be a positive integer, got {value}"
        )));
    }

    Ok(value)
}

/// Identifier of an employee (actor or target subject).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EmployeeId(i64);

impl EmployeeId {
    /// Creates a validated employee identifier.
    pub fn new(value: i64) -> AppResult<Self> {
        Ok(Self(positive(value, "employee id")?))
    }

    /// Returns the underlying integer value.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for EmployeeId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Identifier of a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleId(i64);

impl RoleId {
    /// Creates a validated role identifier.
    pub fn new(value: i64) -> AppResult<Self> {
        Ok(Self(positive(value, "role id")?))
    }

    /// Returns the underlying integer value.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Identifier of a permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionId(i64);

impl PermissionId {
    /// Creates a validated permission identifier.
    pub fn new(value: i64) -> AppResult<Self> {
        Ok(Self(positive(value, "permission id")?))
    }

    /// Returns the underlying integer value.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for PermissionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Identifier of a department.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DepartmentId(i64);

impl DepartmentId {
    /// Creates a validated department identifier.
    pub fn new(value: i64) -> AppResult<Self> {
        Ok(Self(positive(value, "department id")?))
    }

    /// Returns the underlying integer value.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for DepartmentId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Identifier of a scoped permission grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GrantId(i64);

impl GrantId {
    /// Creates a validated grant identifier.
    pub fn new(value: i64) -> AppResult<Self> {
        Ok(Self(positive(value, "grant id")?))
    }

    /// Returns the underlying integer value.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for GrantId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}
