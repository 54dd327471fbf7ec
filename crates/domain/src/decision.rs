use std::str::FromStr;

use rolegate_core::AppError;
use serde::{Deserialize, Serialize};

/// Outcome of a permission resolution. Deny is a successful outcome value,
/// not a failure; callers branch on the verdict, never on an error channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The employee holds the permission under the requested scope.
    Allow,
    /// No assigned role or ancestor carries a matching grant.
    Deny,
}

impl Verdict {
    /// Returns whether the verdict permits the action.
    #[must_use]
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Returns a stable storage value, used as the cached representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }
}

impl FromStr for Verdict {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "allow" => Ok(Self::Allow),
            "deny" => Ok(Self::Deny),
            _ => Err(AppError::Validation(format!(
                "unknown verdict value '{value}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::Verdict;

    #[test]
    fn verdict_round_trips_storage_value() {
        let parsed = Verdict::from_str(Verdict::Deny.as_str());
        assert!(parsed.is_ok());
        assert_eq!(parsed.unwrap_or(Verdict::Allow), Verdict::Deny);
    }

    #[test]
    fn malformed_verdict_is_rejected() {
        assert!(Verdict::from_str("granted").is_err());
    }
}
