//! API route definitions

pub mod cache;
pub mod score;
pub mod tokenomics;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use scorer::EngineError;
use serde_json::json;
use thiserror::Error;

use crate::AppState;

/// Create all API routes
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Query routes
        .route("/tokenomics/:id", get(tokenomics::get_tokenomics))
        .route("/score/:id", get(score::get_score))
        .route("/alias/:term", get(tokenomics::get_alias))
        // Cache management
        .route("/cache-stats", get(cache::get_cache_stats))
        .route("/update-cache", post(cache::update_cache))
        .route("/update-aliases", post(cache::update_aliases))
}

/// Handler failure rendered as `{"error": ...}`
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Engine(err) => match err {
                EngineError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
                EngineError::NotFound(_) => StatusCode::NOT_FOUND,
                EngineError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                EngineError::Upstream(_) => StatusCode::SERVICE_UNAVAILABLE,
                EngineError::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
