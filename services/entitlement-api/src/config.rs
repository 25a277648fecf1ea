//! Configuration for the Entitlement API service.

use std::time::Duration;

use tally_entitlement_core::{normalize, AllowList, EntitlementConfig};

/// Entitlement API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,
    /// Database URL
    pub database_url: String,
    /// Database pool size
    pub database_max_connections: u32,
    /// Entitlement core configuration
    pub entitlement: EntitlementConfig,
    /// When true, state-changing client RPCs are refused for
    /// non-privileged accounts
    pub maintenance_mode: bool,
    /// Request timeout
    pub request_timeout: Duration,
    /// Metrics enabled
    pub metrics_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Database
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let database_max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("DATABASE_MAX_CONNECTIONS"))?;

        // Server port
        let http_port = std::env::var("HTTP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;

        // Webhook secrets
        let stripe_webhook_secret = std::env::var("STRIPE_WEBHOOK_SECRET")
            .map_err(|_| ConfigError::Missing("STRIPE_WEBHOOK_SECRET"))?;

        let lemon_webhook_secret = std::env::var("LEMONSQUEEZY_WEBHOOK_SECRET")
            .map_err(|_| ConfigError::Missing("LEMONSQUEEZY_WEBHOOK_SECRET"))?;

        // Allow-list extension: historically stored as either a JSON array
        // or a comma-separated string, so parse it at this boundary only.
        let allow_list = match std::env::var("ALLOWLIST_EXTRA") {
            Ok(raw) => {
                let extra = match serde_json::from_str::<serde_json::Value>(&raw) {
                    Ok(value) => normalize::email_set(&value),
                    Err(_) => normalize::email_set_from_str(&raw),
                };
                AllowList::builtin().with_extra(extra)
            }
            Err(_) => AllowList::builtin(),
        };

        // QA account honored by the device-local "simulate free" flag
        let test_account_email = std::env::var("TEST_ACCOUNT_EMAIL").ok();

        let free_habit_limit = std::env::var("FREE_HABIT_LIMIT")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("FREE_HABIT_LIMIT"))?;

        let plan_cache_ttl_secs: u64 = std::env::var("PLAN_CACHE_TTL_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("PLAN_CACHE_TTL_SECS"))?;

        let maintenance_mode = std::env::var("MAINTENANCE_MODE")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECS"))?;

        let metrics_enabled = std::env::var("METRICS_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        let mut entitlement = EntitlementConfig::new(&stripe_webhook_secret, &lemon_webhook_secret)
            .with_allow_list(allow_list)
            .with_free_habit_limit(free_habit_limit)
            .with_plan_cache_ttl(Duration::from_secs(plan_cache_ttl_secs));
        if let Some(email) = test_account_email {
            entitlement = entitlement.with_test_account(email);
        }

        Ok(Self {
            http_port,
            database_url,
            database_max_connections,
            entitlement,
            maintenance_mode,
            request_timeout: Duration::from_secs(request_timeout_secs),
            metrics_enabled,
        })
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
