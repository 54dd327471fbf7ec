//! Shared primitives for all Rolegate crates.

#![forbid(unsafe_code)]

/// Validated identifier newtypes shared across services.
pub mod ids;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use ids::{DepartmentId, EmployeeId, GrantId, PermissionId, RoleId};

/// Result type used across Rolegate crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant. Caller bug, never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A parent change would make a role its own ancestor.
    #[error("cycle detected: {0}")]
    CycleDetected(String),

    /// The relational store failed or is unreachable.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The cache backend failed or returned an unusable value. Absorbed by
    /// the resolver, never surfaced from a decision.
    #[error("cache unavailable: {0}")]
    CacheUnavailable(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
