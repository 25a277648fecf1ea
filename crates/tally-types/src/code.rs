//! Redeemable code types

use serde::{Deserialize, Serialize};

/// Lifecycle state of a redeemable code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeStatus {
    /// Issued, never redeemed
    Unused,
    /// Burned by a successful activation
    Used,
    /// Expired before redemption
    Expired,
}

impl std::fmt::Display for CodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unused => write!(f, "unused"),
            Self::Used => write!(f, "used"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

impl std::str::FromStr for CodeStatus {
    type Err = CodeStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unused" => Ok(Self::Unused),
            "used" => Ok(Self::Used),
            "expired" => Ok(Self::Expired),
            _ => Err(CodeStatusParseError(s.to_string())),
        }
    }
}

/// Error parsing a code status string
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid code status: {0}")]
pub struct CodeStatusParseError(pub String);

/// Why a code activation was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationErrorKind {
    /// No code with that identifier exists
    CodeNotFound,
    /// The code was already burned by an earlier activation
    CodeAlreadyUsed,
    /// The code expired before redemption
    CodeExpired,
}

impl ActivationErrorKind {
    /// Wire string for the activation RPC response
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CodeNotFound => "code_not_found",
            Self::CodeAlreadyUsed => "code_already_used",
            Self::CodeExpired => "code_expired",
        }
    }
}

impl std::fmt::Display for ActivationErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a code activation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationOutcome {
    /// Whether the code was burned and the plan upgraded
    pub success: bool,
    /// Rejection reason when `success` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ActivationErrorKind>,
}

impl ActivationOutcome {
    /// Successful activation
    pub const fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    /// Rejected activation
    pub const fn rejected(kind: ActivationErrorKind) -> Self {
        Self {
            success: false,
            error: Some(kind),
        }
    }
}
