//! Query boundary: raw identifiers in, results or classified failures out.
//!
//! Identifiers are validated here, before any resolver runs. The two services
//! are independent; a failure in one never affects the other.

use std::sync::Arc;

use asset_data::{AssetIdentifier, TokenomicsSnapshot};

use crate::{
    error::EngineError,
    resolver::TokenomicsResolver,
    scoring::{ScoreAggregator, ScoreBreakdown},
};

#[derive(Clone)]
pub struct ScoreService {
    aggregator: Arc<ScoreAggregator>,
    resolver: Arc<TokenomicsResolver>,
}

impl ScoreService {
    /// `resolver` maps identifiers to canonical ids, shared with `TokenomicsService`
    pub fn new(aggregator: Arc<ScoreAggregator>, resolver: Arc<TokenomicsResolver>) -> Self {
        Self {
            aggregator,
            resolver,
        }
    }

    pub async fn score(&self, raw_id: &str) -> Result<ScoreBreakdown, EngineError> {
        let id = AssetIdentifier::parse(raw_id)?;
        tracing::info!("Computing score for {}", id);

        let result = match self.resolver.canonical_id(&id).await {
            Ok(coin_id) => self.aggregator.compute(&coin_id).await,
            Err(err) => Err(err),
        };

        result.inspect_err(|err| {
            log_failure("score", &id, err);
        })
    }
}

#[derive(Clone)]
pub struct TokenomicsService {
    resolver: Arc<TokenomicsResolver>,
}

impl TokenomicsService {
    pub fn new(resolver: Arc<TokenomicsResolver>) -> Self {
        Self { resolver }
    }

    pub async fn tokenomics(&self, raw_id: &str) -> Result<TokenomicsSnapshot, EngineError> {
        let id = AssetIdentifier::parse(raw_id)?;
        tracing::info!("Fetching tokenomics for {}", id);

        self.resolver.resolve(&id).await.inspect_err(|err| {
            log_failure("tokenomics", &id, err);
        })
    }

    /// Canonical coin id for a search term
    pub async fn alias(&self, raw_term: &str) -> Result<String, EngineError> {
        let id = AssetIdentifier::parse(raw_term)?;
        self.resolver.resolve_alias(&id).await
    }
}

fn log_failure(operation: &str, id: &AssetIdentifier, err: &EngineError) {
    match err {
        EngineError::NotFound(_) => tracing::info!("{} for {}: not found", operation, id),
        err if err.is_transient() => tracing::warn!("{} for {} failed: {}", operation, id, err),
        err => tracing::error!("{} for {} failed: {}", operation, id, err),
    }
}
