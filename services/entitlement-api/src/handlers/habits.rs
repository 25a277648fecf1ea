//! Habit handlers
//!
//! The habit surface exists to enforce the free-tier cap server-side; the
//! client's local gate is advisory only.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use tally_db::HabitRow;

use crate::error::ApiResult;
use crate::handlers::shared::{
    ensure_available, parse_user_id, record_op_duration, validate_habit_name,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListHabitsQuery {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateHabitRequest {
    pub user_id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct HabitResponse {
    pub id: String,
    pub name: String,
    pub archived: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct ListHabitsResponse {
    pub habits: Vec<HabitResponse>,
}

impl From<HabitRow> for HabitResponse {
    fn from(row: HabitRow) -> Self {
        Self {
            id: row.id.to_string(),
            name: row.name,
            archived: row.archived,
            created_at: row.created_at.to_rfc3339(),
        }
    }
}

/// GET /api/v1/habits
pub async fn list_habits(
    State(state): State<AppState>,
    Query(query): Query<ListHabitsQuery>,
) -> ApiResult<Json<ListHabitsResponse>> {
    let start = Instant::now();

    let user_id = parse_user_id(&query.user_id)?;
    let habits = state.entitlements.list_habits(&user_id).await?;

    record_op_duration("list_habits", start, true);

    Ok(Json(ListHabitsResponse {
        habits: habits.into_iter().map(HabitResponse::from).collect(),
    }))
}

/// POST /api/v1/habits
///
/// Cap violations surface as 403 UPGRADE_REQUIRED via the error mapping.
pub async fn create_habit(
    State(state): State<AppState>,
    Json(req): Json<CreateHabitRequest>,
) -> ApiResult<Json<HabitResponse>> {
    let start = Instant::now();

    let user_id = parse_user_id(&req.user_id)?;
    validate_habit_name(&req.name)?;
    ensure_available(&state, &user_id).await?;

    let habit = state
        .entitlements
        .create_habit(&user_id, req.name.trim())
        .await?;

    metrics::counter!("entitlement_habits_created_total").increment(1);
    record_op_duration("create_habit", start, true);

    tracing::info!(user_id = %user_id, habit_id = %habit.id, "Habit created");

    Ok(Json(habit.into()))
}
