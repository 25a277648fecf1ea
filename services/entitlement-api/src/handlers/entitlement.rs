//! Entitlement resolution handler

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ApiResult;
use crate::handlers::shared::{parse_user_id, record_op_duration};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EntitlementQuery {
    pub user_id: String,
    /// Device-local QA override relayed by the client. Honored only for
    /// the configured test account; can only narrow access.
    #[serde(default)]
    pub simulate_free: bool,
}

#[derive(Debug, Serialize)]
pub struct EntitlementResponse {
    pub is_pro: bool,
    pub plan: String,
    pub pro_expires_at: Option<String>,
    pub history_days: u32,
}

/// GET /api/v1/entitlement
pub async fn get_entitlement(
    State(state): State<AppState>,
    Query(query): Query<EntitlementQuery>,
) -> ApiResult<Json<EntitlementResponse>> {
    let start = Instant::now();

    let user_id = parse_user_id(&query.user_id)?;

    let status = state
        .entitlements
        .resolve_simulated(&user_id, query.simulate_free)
        .await?;

    record_op_duration("get_entitlement", start, true);

    Ok(Json(EntitlementResponse {
        is_pro: status.is_pro,
        plan: status.plan.to_string(),
        pro_expires_at: status.pro_expires_at.map(|t| t.to_rfc3339()),
        history_days: status.history_days,
    }))
}
