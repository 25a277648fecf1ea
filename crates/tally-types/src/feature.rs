//! Gated feature types

use serde::{Deserialize, Serialize};

/// Maximum concurrent (non-archived) habits on the free tier
pub const FREE_HABIT_LIMIT: i64 = 5;

/// History window in days for free accounts
pub const FREE_HISTORY_DAYS: u32 = 30;

/// History window in days for pro accounts
pub const PRO_HISTORY_DAYS: u32 = 365;

/// Pro-gated features in the app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// History beyond the free 30-day window
    ExtendedHistory,
    /// Month-granularity comparative analytics
    MonthlyAnalytics,
    /// Year activity heatmap
    ActivityHeatmap,
    /// Scheduled future letters
    FutureLetters,
    /// More than the free habit cap
    UnlimitedHabits,
}

impl Feature {
    /// Feature ID string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ExtendedHistory => "extended_history",
            Self::MonthlyAnalytics => "monthly_analytics",
            Self::ActivityHeatmap => "activity_heatmap",
            Self::FutureLetters => "future_letters",
            Self::UnlimitedHabits => "unlimited_habits",
        }
    }

    /// Whether the feature is pro-only.
    ///
    /// Every variant currently is; the method exists so gates read the same
    /// if a free-tier feature ever lands here.
    pub const fn requires_pro(&self) -> bool {
        match self {
            Self::ExtendedHistory
            | Self::MonthlyAnalytics
            | Self::ActivityHeatmap
            | Self::FutureLetters
            | Self::UnlimitedHabits => true,
        }
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
