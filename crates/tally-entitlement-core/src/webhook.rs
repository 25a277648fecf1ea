//! Shared webhook machinery
//!
//! Both payment providers verify an HMAC-SHA256 signature over the raw
//! request body and reduce their event vocabulary to the provider-neutral
//! [`PlanChange`] applied by the entitlement service.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::EntitlementError;
use tally_types::UserId;

/// Payment providers that deliver webhooks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Subscription-based provider (Stripe)
    Stripe,
    /// One-time-order provider (Lemon Squeezy)
    LemonSqueezy,
}

impl Provider {
    /// Label for logs and metrics
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stripe => "stripe",
            Self::LemonSqueezy => "lemonsqueezy",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Direction of a plan write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanAction {
    /// Subscription/order completed: plan becomes pro
    Activate,
    /// Subscription cancelled or expired: plan becomes free
    Deactivate,
}

/// How the event correlates back to an account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountKey {
    /// User ID embedded in checkout/order metadata
    UserId(UserId),
    /// Account email
    Email(String),
    /// Previously stored provider customer reference
    PaymentCustomerId(String),
}

/// Provider-neutral plan mutation extracted from a verified webhook event
#[derive(Debug, Clone)]
pub struct PlanChange {
    /// Originating provider
    pub provider: Provider,
    /// Activate or deactivate
    pub action: PlanAction,
    /// Account lookup key
    pub key: AccountKey,
    /// Provider customer reference to persist for cancellation lookups
    pub customer_id: Option<String>,
    /// Provider subscription reference to persist
    pub subscription_id: Option<String>,
    /// Provider event time; drives the optimistic concurrency guard
    pub event_at: DateTime<Utc>,
}

/// HMAC-SHA256 of `data` keyed with `secret`, hex-encoded
pub(crate) fn hmac_sha256_hex(secret: &str, data: &[u8]) -> Result<String, EntitlementError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| EntitlementError::Internal("HMAC error".to_string()))?;
    mac.update(data);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time comparison
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}
