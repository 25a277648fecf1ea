//! Feature-gate policy
//!
//! Pure helpers that turn the resolved entitlement boolean into concrete
//! gate decisions. Callers pass in the resolver output; nothing here
//! re-derives entitlement.

use serde::{Deserialize, Serialize};

use tally_types::{Feature, FREE_HISTORY_DAYS, PRO_HISTORY_DAYS};

/// Historical data window in days for the given entitlement
pub const fn history_window_days(is_pro: bool) -> u32 {
    if is_pro {
        PRO_HISTORY_DAYS
    } else {
        FREE_HISTORY_DAYS
    }
}

/// Comparative analytics granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyticsRange {
    Day,
    Week,
    Month,
}

impl AnalyticsRange {
    /// Day and week are unlocked free; month is Pro-only.
    pub const fn available(&self, is_pro: bool) -> bool {
        match self {
            Self::Day | Self::Week => true,
            Self::Month => is_pro,
        }
    }
}

/// Whether a gated feature is available for the given entitlement
pub const fn feature_available(feature: Feature, is_pro: bool) -> bool {
    !feature.requires_pro() || is_pro
}

/// Outcome of the habit-creation gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateHabitDecision {
    /// Creation may proceed
    Allowed,
    /// Free-tier cap hit; caller must upgrade
    UpgradeRequired {
        /// The cap that was hit
        limit: i64,
    },
}

/// Decide whether a user may create another habit.
///
/// Pro and privileged (allow-listed) accounts are uncapped; free accounts
/// are limited to `limit` concurrent non-archived habits.
pub const fn can_create_habit(
    is_pro: bool,
    privileged: bool,
    active_count: i64,
    limit: i64,
) -> CreateHabitDecision {
    if is_pro || privileged || active_count < limit {
        CreateHabitDecision::Allowed
    } else {
        CreateHabitDecision::UpgradeRequired { limit }
    }
}
