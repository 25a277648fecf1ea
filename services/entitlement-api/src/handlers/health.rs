//! Health check handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub plan_store: &'static str,
}

/// Liveness probe - always returns OK if the service is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "entitlement-api",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness probe.
///
/// The service is useless without the plan store: every entitlement read,
/// code burn, and webhook write goes through it, so readiness is a
/// round-trip against it.
pub async fn ready(State(state): State<AppState>) -> Result<Json<ReadyResponse>, StatusCode> {
    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => Ok(Json(ReadyResponse {
            status: "ready",
            plan_store: "reachable",
        })),
        Err(e) => {
            tracing::error!(error = ?e, "Plan store readiness check failed");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
