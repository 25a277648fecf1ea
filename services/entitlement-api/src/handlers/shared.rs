//! Shared handler utilities
//!
//! Common validation, maintenance gating, and metrics helpers used across
//! handlers. Centralizing these keeps policies consistent.

use std::time::Instant;

use tally_types::UserId;

use crate::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Input Validation
// ============================================================================

/// Maximum length for redeemable codes
const MAX_CODE_LEN: usize = 64;

/// Maximum length for habit names
const MAX_HABIT_NAME_LEN: usize = 100;

/// Parse and validate a user id from a request field.
pub fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    UserId::parse(raw).map_err(|_| ApiError::BadRequest("Invalid user_id".to_string()))
}

/// Validate a redeemable code string.
///
/// Codes are opaque tokens minted by us; restrict the charset so garbage
/// input never reaches the database or metrics labels.
pub fn validate_code(code: &str) -> Result<(), ApiError> {
    if code.is_empty() {
        return Err(ApiError::BadRequest("Code cannot be empty".into()));
    }

    if code.len() > MAX_CODE_LEN {
        return Err(ApiError::BadRequest(format!(
            "Code too long (max {MAX_CODE_LEN} chars)"
        )));
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ApiError::BadRequest(
            "Code contains invalid characters (use alphanumeric, -, _)".into(),
        ));
    }

    Ok(())
}

/// Validate a habit name.
pub fn validate_habit_name(name: &str) -> Result<(), ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest("Habit name cannot be empty".into()));
    }

    if trimmed.len() > MAX_HABIT_NAME_LEN {
        return Err(ApiError::BadRequest(format!(
            "Habit name too long (max {MAX_HABIT_NAME_LEN} chars)"
        )));
    }

    Ok(())
}

// ============================================================================
// Maintenance Gating
// ============================================================================

/// Refuse state-changing requests during maintenance mode.
///
/// Allow-listed accounts pass through so operators can verify the service
/// while it is closed to everyone else.
pub async fn ensure_available(state: &AppState, user_id: &UserId) -> Result<(), ApiError> {
    if !state.config.maintenance_mode {
        return Ok(());
    }

    let record = state.entitlements.account_plan(user_id).await?;
    if state.entitlements.is_privileged(&record.email) {
        tracing::debug!(user_id = %user_id, "Maintenance bypass for privileged account");
        return Ok(());
    }

    Err(ApiError::Maintenance)
}

// ============================================================================
// Metrics Helpers
// ============================================================================

/// Record operation duration with result label.
#[inline]
pub fn record_op_duration(operation: &'static str, start: Instant, success: bool) {
    let result = if success { "ok" } else { "err" };
    metrics::histogram!(
        "entitlement_operation_duration_seconds",
        "operation" => operation,
        "result" => result
    )
    .record(start.elapsed().as_secs_f64());
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_code_valid() {
        assert!(validate_code("TALLY-2024").is_ok());
        assert!(validate_code("abc_123").is_ok());
        assert!(validate_code("X").is_ok());
    }

    #[test]
    fn test_validate_code_invalid() {
        assert!(validate_code("").is_err());
        assert!(validate_code(&"a".repeat(MAX_CODE_LEN + 1)).is_err());
        assert!(validate_code("has space").is_err());
        assert!(validate_code("semi;colon").is_err());
        assert!(validate_code("nul\0byte").is_err());
    }

    #[test]
    fn test_validate_habit_name() {
        assert!(validate_habit_name("read").is_ok());
        assert!(validate_habit_name("  read  ").is_ok());
        assert!(validate_habit_name("").is_err());
        assert!(validate_habit_name("   ").is_err());
        assert!(validate_habit_name(&"a".repeat(MAX_HABIT_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_parse_user_id() {
        assert!(parse_user_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(parse_user_id("not-a-uuid").is_err());
        assert!(parse_user_id("").is_err());
    }
}
