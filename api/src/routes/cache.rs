//! Cache management routes

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use super::ApiError;
use crate::AppState;

const DEFAULT_POPULAR_LIMIT: usize = 20;

/// POST /api/update-cache
///
/// Body is one of:
/// - `{"coin_id": "bitcoin"}`
/// - `{"coin_ids": ["bitcoin", "ethereum"]}`
/// - `{"popular": true, "limit": 20}`
pub async fn update_cache(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let updater = &state.engine.updater;

    if let Some(coin_id) = body.get("coin_id") {
        let coin_id = coin_id
            .as_str()
            .ok_or_else(|| ApiError::BadRequest("coin_id must be a string".to_string()))?;

        let result = updater.update_coin(coin_id).await;
        let (status, message) = if result.tokenomics_updated {
            (StatusCode::OK, format!("Cache updated for {coin_id}"))
        } else {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to update cache for {coin_id}"),
            )
        };

        return Ok((
            status,
            Json(json!({
                "success": result.tokenomics_updated,
                "message": message,
                "result": result,
            })),
        ));
    }

    if let Some(coin_ids) = body.get("coin_ids") {
        let coin_ids: Vec<String> = coin_ids
            .as_array()
            .and_then(|ids| {
                ids.iter()
                    .map(|id| id.as_str().map(str::to_string))
                    .collect()
            })
            .ok_or_else(|| ApiError::BadRequest("coin_ids must be an array".to_string()))?;

        let result = updater.update_coins(&coin_ids).await;
        return Ok((
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": format!(
                    "Batch update complete: {} succeeded, {} failed",
                    result.succeeded, result.failed
                ),
                "result": result,
            })),
        ));
    }

    if body.get("popular").and_then(Value::as_bool).unwrap_or(false) {
        let limit = match body.get("limit") {
            None => DEFAULT_POPULAR_LIMIT,
            Some(limit) => limit
                .as_u64()
                .map(|limit| limit as usize)
                .ok_or_else(|| ApiError::BadRequest("limit must be a positive integer".to_string()))?,
        };

        let result = updater.update_popular(limit).await;
        return Ok((
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": format!("Updated {} popular coins", result.succeeded),
                "result": result,
            })),
        ));
    }

    Err(ApiError::BadRequest(
        "Must provide 'coin_id', 'coin_ids', or 'popular' parameter".to_string(),
    ))
}

/// POST /api/update-aliases
/// Rebuilds the alias table from the provider's full coin list
pub async fn update_aliases(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let result = state.engine.updater.update_aliases().await;

    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (status, Json(result))
}

/// GET /api/cache-stats
pub async fn get_cache_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.engine.updater.cache_stats().await)
}
