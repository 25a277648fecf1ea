//! Payment provider webhook handlers
//!
//! Both providers follow the same shape: verify the signature over the raw
//! body, reduce the event to a plan change, apply it guarded by event time.
//! Stale and unmatched events are acknowledged with 200 so providers stop
//! retrying; only transient failures return 5xx.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use std::time::Instant;

use tally_entitlement_core::{EntitlementError, PlanChange, Provider};

use crate::state::AppState;

/// POST /webhooks/stripe
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let Some(signature) = header_str(&headers, "stripe-signature", Provider::Stripe) else {
        return StatusCode::BAD_REQUEST;
    };

    let parsed = state.stripe.verify_and_parse(&body, &signature);
    apply(&state, Provider::Stripe, parsed).await
}

/// POST /webhooks/lemonsqueezy
pub async fn lemonsqueezy_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let Some(signature) = header_str(&headers, "x-signature", Provider::LemonSqueezy) else {
        return StatusCode::BAD_REQUEST;
    };

    let parsed = state.lemon.verify_and_parse(&body, &signature);
    apply(&state, Provider::LemonSqueezy, parsed).await
}

fn header_str(headers: &HeaderMap, name: &str, provider: Provider) -> Option<String> {
    let Some(value) = headers.get(name) else {
        tracing::warn!(provider = provider.as_str(), header = name, "Missing signature header");
        return None;
    };

    match value.to_str() {
        Ok(s) => Some(s.to_string()),
        Err(_) => {
            tracing::warn!(
                provider = provider.as_str(),
                header = name,
                "Invalid signature header encoding"
            );
            None
        }
    }
}

async fn apply(
    state: &AppState,
    provider: Provider,
    parsed: Result<Option<PlanChange>, EntitlementError>,
) -> StatusCode {
    let start = Instant::now();

    match parsed {
        Ok(Some(change)) => match state.entitlements.apply_plan_change(&change).await {
            Ok(outcome) => {
                record(provider, outcome.as_str(), start);
                // Unmatched and stale events are acknowledged, not retried
                StatusCode::OK
            }
            Err(e) => {
                tracing::error!(
                    provider = provider.as_str(),
                    error = ?e,
                    "Failed to apply webhook plan change"
                );
                record(provider, "error", start);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        },
        // Event type carries no plan semantics
        Ok(None) => {
            record(provider, "ignored", start);
            StatusCode::OK
        }
        Err(EntitlementError::SignatureInvalid) => {
            tracing::warn!(provider = provider.as_str(), "Webhook signature rejected");
            record(provider, "signature_invalid", start);
            StatusCode::UNAUTHORIZED
        }
        Err(EntitlementError::WebhookError(msg)) => {
            tracing::warn!(provider = provider.as_str(), error = %msg, "Malformed webhook payload");
            record(provider, "malformed", start);
            StatusCode::BAD_REQUEST
        }
        Err(e) => {
            tracing::error!(provider = provider.as_str(), error = ?e, "Webhook processing failed");
            record(provider, "error", start);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn record(provider: Provider, status: &'static str, start: Instant) {
    metrics::counter!(
        "entitlement_webhooks_processed_total",
        "provider" => provider.as_str(),
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "entitlement_operation_duration_seconds",
        "operation" => "process_webhook",
        "result" => if status == "applied" || status == "ignored" { "ok" } else { "err" }
    )
    .record(start.elapsed().as_secs_f64());
}
