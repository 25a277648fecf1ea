//! Code activation handler

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use std::time::Instant;

use tally_types::ActivationOutcome;

use crate::error::ApiResult;
use crate::handlers::shared::{ensure_available, parse_user_id, record_op_duration, validate_code};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ActivateCodeRequest {
    pub code: String,
    pub user_id: String,
}

/// POST /api/v1/codes/activate
///
/// Redeem a single-use code for a permanent Pro grant. Rejections that are
/// part of the activation contract (unknown, already used, expired) come
/// back as 200 with `success: false` and a stable error string; transport
/// and server failures use error status codes.
pub async fn activate_code(
    State(state): State<AppState>,
    Json(req): Json<ActivateCodeRequest>,
) -> ApiResult<Json<ActivationOutcome>> {
    let start = Instant::now();

    let user_id = parse_user_id(&req.user_id)?;
    validate_code(&req.code)?;
    ensure_available(&state, &user_id).await?;

    match state.entitlements.redeem_code(&req.code, &user_id).await {
        Ok(()) => {
            metrics::counter!("entitlement_code_activations_total", "result" => "success")
                .increment(1);
            record_op_duration("activate_code", start, true);

            Ok(Json(ActivationOutcome::ok()))
        }
        Err(e) => match e.activation_kind() {
            Some(kind) => {
                metrics::counter!(
                    "entitlement_code_activations_total",
                    "result" => kind.as_str()
                )
                .increment(1);
                record_op_duration("activate_code", start, false);

                tracing::info!(user_id = %user_id, reason = kind.as_str(), "Activation rejected");

                Ok(Json(ActivationOutcome::rejected(kind)))
            }
            None => {
                metrics::counter!("entitlement_code_activations_total", "result" => "error")
                    .increment(1);
                record_op_duration("activate_code", start, false);
                Err(e.into())
            }
        },
    }
}
