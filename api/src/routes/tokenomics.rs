//! Tokenomics API routes

use std::sync::Arc;

use asset_data::TokenomicsSnapshot;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AliasResponse {
    pub search_term: String,
    pub canonical_id: String,
}

/// GET /api/tokenomics/:id
/// Returns name, symbol, market cap and supply figures
pub async fn get_tokenomics(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TokenomicsSnapshot>, ApiError> {
    let snapshot = state.engine.tokenomics.tokenomics(&id).await?;
    Ok(Json(snapshot))
}

/// GET /api/alias/:term
/// Resolves an id, symbol or name to the canonical coin id
pub async fn get_alias(
    State(state): State<Arc<AppState>>,
    Path(term): Path<String>,
) -> Result<Json<AliasResponse>, ApiError> {
    let canonical_id = state.engine.tokenomics.alias(&term).await?;

    Ok(Json(AliasResponse {
        search_term: term,
        canonical_id,
    }))
}
