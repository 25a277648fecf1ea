//! Tally Entitlement Core - Pro entitlement business logic
//!
//! Everything that decides or mutates "is this user allowed Pro features":
//! the pure resolver, the admin allow-list, webhook verification for both
//! payment providers, single-use code redemption, and the feature-gate
//! policy. The HTTP service in `services/entitlement-api` is a thin shell
//! over this crate.
//!
//! # Example
//!
//! ```rust,ignore
//! use tally_entitlement_core::{EntitlementConfig, EntitlementService};
//!
//! let config = EntitlementConfig::new("whsec_...", "lsq_...")
//!     .with_test_account("qa@trytally.app");
//!
//! let service = EntitlementService::new(accounts, codes, habits, config);
//!
//! let status = service.resolve(&user_id).await?;
//! let outcome = service.redeem_code("ABC123", &user_id).await?;
//! ```

pub mod config;
pub mod error;
pub mod gates;
pub mod lemonsqueezy;
pub mod normalize;
pub mod resolver;
pub mod service;
pub mod stripe;
pub mod webhook;

pub use config::EntitlementConfig;
pub use error::EntitlementError;
pub use gates::{history_window_days, AnalyticsRange, CreateHabitDecision};
pub use lemonsqueezy::LemonWebhook;
pub use resolver::{resolve_effective, resolve_is_pro, AllowList, LocalOverride};
pub use service::{EntitlementService, EntitlementStatus, PlanChangeOutcome};
pub use stripe::StripeWebhook;
pub use webhook::{AccountKey, PlanAction, PlanChange, Provider};
