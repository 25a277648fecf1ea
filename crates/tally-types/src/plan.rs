//! Plan tier types

use serde::{Deserialize, Serialize};

/// Account plan tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    /// Free tier - 5 habits, 30 days of history
    Free,
    /// Pro tier - unlimited habits, full history, analytics
    Pro,
}

impl Plan {
    /// Parse a stored plan value, treating anything unrecognized as free.
    ///
    /// Stored plan fields come from several writers over the app's history,
    /// so unknown values must degrade safely instead of erroring.
    pub fn from_stored(s: Option<&str>) -> Self {
        s.and_then(|s| s.parse().ok()).unwrap_or(Self::Free)
    }

    /// Whether this is the pro tier
    pub const fn is_pro(&self) -> bool {
        matches!(self, Self::Pro)
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Pro => write!(f, "pro"),
        }
    }
}

impl std::str::FromStr for Plan {
    type Err = PlanParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "pro" | "premium" => Ok(Self::Pro),
            _ => Err(PlanParseError(s.to_string())),
        }
    }
}

/// Error parsing a plan string
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid plan: {0}")]
pub struct PlanParseError(pub String);
