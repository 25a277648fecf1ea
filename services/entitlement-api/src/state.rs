//! Application state for the Entitlement API service.

use std::sync::Arc;

use tally_db::pg::{PgAccountRepository, PgHabitRepository, PgRedeemCodeRepository};
use tally_db::DbPool;
use tally_entitlement_core::{EntitlementService, LemonWebhook, StripeWebhook};

use crate::config::Config;

/// The concrete entitlement service wired to Postgres repositories
pub type Service =
    EntitlementService<PgAccountRepository, PgRedeemCodeRepository, PgHabitRepository>;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Entitlement service (resolution, redemption, plan changes, gates)
    pub entitlements: Arc<Service>,
    /// Stripe webhook verifier
    pub stripe: StripeWebhook,
    /// Lemon Squeezy webhook verifier
    pub lemon: LemonWebhook,
    /// Database pool (readiness probe)
    pub pool: DbPool,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(entitlements: Service, pool: DbPool, config: Config) -> Self {
        let stripe = StripeWebhook::new(&config.entitlement.stripe_webhook_secret);
        let lemon = LemonWebhook::new(&config.entitlement.lemon_webhook_secret);
        Self {
            entitlements: Arc::new(entitlements),
            stripe,
            lemon,
            pool,
            config: Arc::new(config),
        }
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
