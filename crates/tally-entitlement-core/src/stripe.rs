//! Stripe webhook verification and parsing
//!
//! Signature scheme: `Stripe-Signature: t=<ts>,v1=<hex>` where `v1` is
//! HMAC-SHA256 over `"<ts>.<body>"` with the endpoint's signing secret.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::error::EntitlementError;
use crate::webhook::{constant_time_eq, hmac_sha256_hex, AccountKey, PlanAction, PlanChange, Provider};
use tally_types::UserId;

/// Maximum accepted clock skew between the signature timestamp and now
const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

/// Stripe event types we act on
#[derive(Debug, Clone, PartialEq, Eq)]
enum StripeEventType {
    CheckoutSessionCompleted,
    SubscriptionCreated,
    SubscriptionUpdated,
    SubscriptionDeleted,
    Unknown(String),
}

impl From<&str> for StripeEventType {
    fn from(s: &str) -> Self {
        match s {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            "customer.subscription.created" => Self::SubscriptionCreated,
            "customer.subscription.updated" => Self::SubscriptionUpdated,
            "customer.subscription.deleted" => Self::SubscriptionDeleted,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Stripe webhook verifier/parser
#[derive(Clone)]
pub struct StripeWebhook {
    webhook_secret: String,
}

impl StripeWebhook {
    /// Create a verifier for the given signing secret
    pub fn new(webhook_secret: impl Into<String>) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
        }
    }

    /// Verify the signature and reduce the event to a plan change.
    ///
    /// Returns `Ok(None)` for event types that carry no plan semantics
    /// (acknowledged but ignored).
    #[instrument(skip(self, payload, signature))]
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<Option<PlanChange>, EntitlementError> {
        self.verify_signature(payload, signature)?;

        let raw: RawStripeEvent = serde_json::from_slice(payload)
            .map_err(|e| EntitlementError::WebhookError(e.to_string()))?;

        debug!(event_id = %raw.id, event_type = %raw.event_type, "Parsed Stripe event");

        let event_at = Utc
            .timestamp_opt(raw.created, 0)
            .single()
            .ok_or_else(|| EntitlementError::WebhookError("Invalid event timestamp".to_string()))?;

        match StripeEventType::from(raw.event_type.as_str()) {
            StripeEventType::CheckoutSessionCompleted => {
                let session: RawCheckoutSession = serde_json::from_value(raw.data.object)
                    .map_err(|e| EntitlementError::WebhookError(e.to_string()))?;
                Ok(Some(Self::checkout_change(session, event_at)?))
            }
            StripeEventType::SubscriptionCreated | StripeEventType::SubscriptionUpdated => {
                let sub: RawSubscription = serde_json::from_value(raw.data.object)
                    .map_err(|e| EntitlementError::WebhookError(e.to_string()))?;
                Ok(Some(Self::subscription_change(sub, false, event_at)))
            }
            StripeEventType::SubscriptionDeleted => {
                let sub: RawSubscription = serde_json::from_value(raw.data.object)
                    .map_err(|e| EntitlementError::WebhookError(e.to_string()))?;
                Ok(Some(Self::subscription_change(sub, true, event_at)))
            }
            StripeEventType::Unknown(other) => {
                debug!(event_type = %other, "Ignoring Stripe event with no plan semantics");
                Ok(None)
            }
        }
    }

    fn checkout_change(
        session: RawCheckoutSession,
        event_at: DateTime<Utc>,
    ) -> Result<PlanChange, EntitlementError> {
        // Correlate via the user id planted at checkout creation, falling
        // back to the customer email Stripe collected.
        let user_ref = session
            .client_reference_id
            .or_else(|| session.metadata.as_ref().and_then(|m| m.user_id.clone()));

        let key = match user_ref {
            Some(id) => AccountKey::UserId(
                UserId::parse(&id)
                    .map_err(|_| EntitlementError::WebhookError("Invalid user reference".to_string()))?,
            ),
            None => AccountKey::Email(session.customer_email.ok_or_else(|| {
                EntitlementError::WebhookError("No user reference or email on session".to_string())
            })?),
        };

        Ok(PlanChange {
            provider: Provider::Stripe,
            action: PlanAction::Activate,
            key,
            customer_id: session.customer,
            subscription_id: session.subscription,
            event_at,
        })
    }

    fn subscription_change(sub: RawSubscription, deleted: bool, event_at: DateTime<Utc>) -> PlanChange {
        let cancelled =
            deleted || matches!(sub.status.as_str(), "canceled" | "unpaid" | "incomplete_expired");

        PlanChange {
            provider: Provider::Stripe,
            action: if cancelled {
                PlanAction::Deactivate
            } else {
                PlanAction::Activate
            },
            key: AccountKey::PaymentCustomerId(sub.customer.clone()),
            customer_id: Some(sub.customer),
            subscription_id: Some(sub.id),
            event_at,
        }
    }

    /// Verify the `t=...,v1=...` signature header
    fn verify_signature(&self, payload: &[u8], signature: &str) -> Result<(), EntitlementError> {
        let mut timestamp: Option<&str> = None;
        let mut sig_v1: Option<&str> = None;

        for part in signature.split(',') {
            if let Some((key, value)) = part.split_once('=') {
                match key {
                    "t" => timestamp = Some(value),
                    "v1" => sig_v1 = Some(value),
                    _ => {}
                }
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            warn!("Missing timestamp in Stripe signature header");
            EntitlementError::WebhookError("Missing timestamp".to_string())
        })?;

        let sig_v1 = sig_v1.ok_or_else(|| {
            warn!("Missing v1 signature in Stripe signature header");
            EntitlementError::WebhookError("Missing signature".to_string())
        })?;

        let body = std::str::from_utf8(payload)
            .map_err(|_| EntitlementError::WebhookError("Invalid payload encoding".to_string()))?;
        let signed_payload = format!("{timestamp}.{body}");

        let expected = hmac_sha256_hex(&self.webhook_secret, signed_payload.as_bytes())?;

        if !constant_time_eq(sig_v1.as_bytes(), expected.as_bytes()) {
            warn!("Stripe webhook signature verification failed");
            return Err(EntitlementError::SignatureInvalid);
        }

        // Reject stale deliveries to limit replay windows
        let ts: i64 = timestamp
            .parse()
            .map_err(|_| EntitlementError::WebhookError("Invalid timestamp format".to_string()))?;
        let now = Utc::now().timestamp();
        if (now - ts).abs() > TIMESTAMP_TOLERANCE_SECS {
            warn!(timestamp = ts, now = now, "Stripe webhook timestamp too old");
            return Err(EntitlementError::SignatureInvalid);
        }

        Ok(())
    }
}

// Raw Stripe shapes, parsed permissively

#[derive(Debug, Deserialize)]
struct RawStripeEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
    created: i64,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
    object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RawCheckoutSession {
    customer: Option<String>,
    subscription: Option<String>,
    client_reference_id: Option<String>,
    customer_email: Option<String>,
    metadata: Option<RawSessionMetadata>,
}

#[derive(Debug, Deserialize)]
struct RawSessionMetadata {
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSubscription {
    id: String,
    customer: String,
    status: String,
}
