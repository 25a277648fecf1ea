//! Lemon Squeezy webhook verification and parsing
//!
//! Signature scheme: `X-Signature: <hex>` where the value is HMAC-SHA256
//! over the raw request body with the store's signing secret. Events carry
//! their name in `meta.event_name` and the purchasing user's id in
//! `meta.custom_data.user_id` (planted on the checkout link).

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::error::EntitlementError;
use crate::webhook::{constant_time_eq, hmac_sha256_hex, AccountKey, PlanAction, PlanChange, Provider};
use tally_types::UserId;

/// Lemon Squeezy webhook verifier/parser
#[derive(Clone)]
pub struct LemonWebhook {
    webhook_secret: String,
}

impl LemonWebhook {
    /// Create a verifier for the given signing secret
    pub fn new(webhook_secret: impl Into<String>) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
        }
    }

    /// Verify the signature and reduce the event to a plan change.
    ///
    /// Returns `Ok(None)` for event names with no plan semantics.
    #[instrument(skip(self, payload, signature))]
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<Option<PlanChange>, EntitlementError> {
        self.verify_signature(payload, signature)?;

        let raw: RawLemonEvent = serde_json::from_slice(payload)
            .map_err(|e| EntitlementError::WebhookError(e.to_string()))?;

        debug!(event_name = %raw.meta.event_name, "Parsed Lemon Squeezy event");

        let action = match raw.meta.event_name.as_str() {
            "order_created" | "subscription_created" | "subscription_resumed" => {
                PlanAction::Activate
            }
            "subscription_cancelled" | "subscription_expired" => PlanAction::Deactivate,
            other => {
                debug!(event_name = %other, "Ignoring Lemon Squeezy event with no plan semantics");
                return Ok(None);
            }
        };

        let customer_id = raw.data.attributes.customer_id.map(|id| id.to_string());

        // Activations correlate via the user id planted on the checkout
        // link (or the buyer email); cancellations via the stored customer
        // reference from the original activation.
        let key = match action {
            PlanAction::Activate => match raw.meta.custom_data.and_then(|d| d.user_id) {
                Some(id) => AccountKey::UserId(UserId::parse(&id).map_err(|_| {
                    EntitlementError::WebhookError("Invalid user reference".to_string())
                })?),
                None => AccountKey::Email(raw.data.attributes.user_email.ok_or_else(|| {
                    EntitlementError::WebhookError("No user reference or email on event".to_string())
                })?),
            },
            PlanAction::Deactivate => AccountKey::PaymentCustomerId(
                customer_id
                    .clone()
                    .ok_or_else(|| {
                        EntitlementError::WebhookError("No customer id on event".to_string())
                    })?,
            ),
        };

        // `created_at` is fixed for the subscription's whole lifecycle, so a
        // cancellation would carry the same time as the original activation
        // and lose against the event-time guard. `updated_at` advances with
        // every lifecycle event; missing timestamps fall back to delivery
        // time, which the guard treats as newest (arrival order).
        let event_at = raw
            .data
            .attributes
            .updated_at
            .or(raw.data.attributes.created_at)
            .unwrap_or_else(Utc::now);

        Ok(Some(PlanChange {
            provider: Provider::LemonSqueezy,
            action,
            key,
            customer_id,
            subscription_id: raw.data.id,
            event_at,
        }))
    }

    fn verify_signature(&self, payload: &[u8], signature: &str) -> Result<(), EntitlementError> {
        if signature.is_empty() {
            return Err(EntitlementError::WebhookError(
                "Missing signature".to_string(),
            ));
        }

        let expected = hmac_sha256_hex(&self.webhook_secret, payload)?;

        if !constant_time_eq(signature.trim().as_bytes(), expected.as_bytes()) {
            warn!("Lemon Squeezy webhook signature verification failed");
            return Err(EntitlementError::SignatureInvalid);
        }

        Ok(())
    }
}

// Raw Lemon Squeezy shapes, parsed permissively

#[derive(Debug, Deserialize)]
struct RawLemonEvent {
    meta: RawMeta,
    data: RawData,
}

#[derive(Debug, Deserialize)]
struct RawMeta {
    event_name: String,
    custom_data: Option<RawCustomData>,
}

#[derive(Debug, Deserialize)]
struct RawCustomData {
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawData {
    id: Option<String>,
    attributes: RawAttributes,
}

#[derive(Debug, Deserialize)]
struct RawAttributes {
    customer_id: Option<i64>,
    user_email: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}
