//! Score API routes

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use scorer::ScoreBreakdown;

use super::ApiError;
use crate::AppState;

/// GET /api/score/:id
/// Returns the composite score with its per-factor breakdown
pub async fn get_score(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ScoreBreakdown>, ApiError> {
    let result = state.engine.score.score(&id).await?;
    Ok(Json(result))
}
