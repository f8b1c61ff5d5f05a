//! Upstream data sources
//!
//! - Market data (price feed): market cap, volume, supply, repository links
//! - Repository hosting: development activity for a project's repository

pub mod coingecko;
pub mod github;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    entity::{AssetIdentifier, CoinData, CoinListing, GitHubMetrics, RepoRef},
    error::ProviderError,
};

/// A source of market data for crypto assets
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Provider name used in logs and errors
    fn name(&self) -> &'static str;

    /// Resolve a search query (id, symbol or name) to this provider's coin id
    async fn resolve_coin_id(&self, query: &AssetIdentifier) -> Result<String, ProviderError>;

    /// Market data for a coin id returned by `resolve_coin_id`
    async fn coin_data(&self, coin_id: &str) -> Result<CoinData, ProviderError>;

    /// Every coin the provider knows about
    async fn coins_list(&self) -> Result<Vec<CoinListing>, ProviderError>;

    /// Whether the provider is reachable and not rate limited
    async fn check_health(&self) -> bool;
}

/// A source-code hosting platform
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Activity metrics for a repository, `Ok(None)` when the host has no such repository
    async fn repository_metrics(
        &self,
        repo: &RepoRef,
    ) -> Result<Option<GitHubMetrics>, ProviderError>;
}

/// Ordered market data providers with automatic fallback.
///
/// Each call tries the providers in order until one succeeds. The call fails
/// with `NotFound` only when every provider reported the coin as unknown;
/// otherwise the last upstream failure is returned.
#[derive(Clone)]
pub struct MarketData {
    providers: Vec<Arc<dyn MarketDataProvider>>,
}

impl MarketData {
    pub fn new(providers: Vec<Arc<dyn MarketDataProvider>>) -> Self {
        Self { providers }
    }

    pub fn single(provider: impl MarketDataProvider + 'static) -> Self {
        Self::new(vec![Arc::new(provider)])
    }

    /// Append a provider to the fallback chain
    pub fn add_provider(&mut self, provider: Arc<dyn MarketDataProvider>) {
        self.providers.push(provider);
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Resolve a query to a canonical coin id
    pub async fn resolve_coin_id(&self, query: &AssetIdentifier) -> Result<String, ProviderError> {
        let mut errors = Vec::new();

        for provider in &self.providers {
            match provider.resolve_coin_id(query).await {
                Ok(coin_id) => return Ok(coin_id),
                Err(err) => {
                    tracing::debug!("{} could not resolve {}: {}", provider.name(), query, err);
                    errors.push(err);
                }
            }
        }

        Err(settle(errors, query.as_str()))
    }

    /// Resolve a query and fetch its market data from the first provider that has it
    pub async fn coin_data(&self, query: &AssetIdentifier) -> Result<CoinData, ProviderError> {
        let mut errors = Vec::new();

        for provider in &self.providers {
            tracing::debug!("Trying {} for {}", provider.name(), query);

            let result = match provider.resolve_coin_id(query).await {
                Ok(coin_id) => provider.coin_data(&coin_id).await,
                Err(err) => Err(err),
            };

            match result {
                Ok(data) => return Ok(data),
                Err(err) => {
                    if err.is_not_found() {
                        tracing::debug!("{}: {}", provider.name(), err);
                    } else {
                        tracing::warn!("{} failed for {}: {}", provider.name(), query, err);
                    }
                    errors.push(err);
                }
            }
        }

        Err(settle(errors, query.as_str()))
    }

    /// Full coin listing from the first provider that answers
    pub async fn coins_list(&self) -> Result<Vec<CoinListing>, ProviderError> {
        let mut errors = Vec::new();

        for provider in &self.providers {
            match provider.coins_list().await {
                Ok(coins) => return Ok(coins),
                Err(err) => {
                    tracing::warn!("{} coins list failed: {}", provider.name(), err);
                    errors.push(err);
                }
            }
        }

        Err(settle(errors, "coins list"))
    }

    /// Health of every provider, in fallback order
    pub async fn check_health(&self) -> Vec<(&'static str, bool)> {
        let mut health = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            health.push((provider.name(), provider.check_health().await));
        }
        health
    }
}

/// Collapse per-provider failures into one error, the last upstream failure
/// winning over any `NotFound`
fn settle(errors: Vec<ProviderError>, subject: &str) -> ProviderError {
    errors
        .into_iter()
        .rev()
        .find(|err| !err.is_not_found())
        .unwrap_or_else(|| ProviderError::NotFound(subject.to_string()))
}

#[cfg(test)]
mod tests {
    use super::memory::InMemoryMarketData;
    use super::*;

    fn bitcoin() -> CoinData {
        CoinData {
            id: "bitcoin".to_string(),
            name: "Bitcoin".to_string(),
            symbol: "btc".to_string(),
            market_cap_usd: Some(1.2e12),
            volume_24h_usd: Some(3.0e10),
            ..Default::default()
        }
    }

    fn id(raw: &str) -> AssetIdentifier {
        AssetIdentifier::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_falls_back_to_next_provider() {
        let failing = Arc::new(
            InMemoryMarketData::new()
                .with_coin(bitcoin())
                .failing(ProviderError::RateLimited("first".to_string())),
        );
        let healthy = Arc::new(InMemoryMarketData::new().with_coin(bitcoin()));

        let market = MarketData::new(vec![failing.clone(), healthy.clone()]);
        let data = market.coin_data(&id("btc")).await.unwrap();

        assert_eq!(data.id, "bitcoin");
        assert_eq!(failing.calls(), 1);
        assert_eq!(healthy.calls(), 2); // resolve + fetch
    }

    #[tokio::test]
    async fn test_not_found_only_when_every_provider_agrees() {
        let a = Arc::new(InMemoryMarketData::new());
        let b = Arc::new(InMemoryMarketData::new());
        let market = MarketData::new(vec![a, b]);

        let err = market.coin_data(&id("not-a-real-coin-xyz")).await.unwrap_err();
        assert_eq!(err, ProviderError::NotFound("not-a-real-coin-xyz".to_string()));
    }

    #[tokio::test]
    async fn test_upstream_failure_wins_over_not_found() {
        let unknown = Arc::new(InMemoryMarketData::new());
        let down = Arc::new(
            InMemoryMarketData::new().failing(ProviderError::Http("502 Bad Gateway".to_string())),
        );
        let market = MarketData::new(vec![unknown, down]);

        let err = market.coin_data(&id("bitcoin")).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_last_upstream_failure_is_surfaced() {
        let mut market = MarketData::single(
            InMemoryMarketData::new().failing(ProviderError::RateLimited("first".to_string())),
        );
        market.add_provider(Arc::new(InMemoryMarketData::new()));
        market.add_provider(Arc::new(
            InMemoryMarketData::new().failing(ProviderError::Http("502 Bad Gateway".to_string())),
        ));

        let err = market.coin_data(&id("bitcoin")).await.unwrap_err();
        assert_eq!(err, ProviderError::Http("502 Bad Gateway".to_string()));
    }

    #[tokio::test]
    async fn test_added_provider_extends_fallback_chain() {
        let mut market = MarketData::single(InMemoryMarketData::new());
        let backup = Arc::new(InMemoryMarketData::new().with_coin(bitcoin()));
        market.add_provider(backup.clone());

        assert_eq!(market.provider_names(), vec!["InMemory", "InMemory"]);
        assert_eq!(market.resolve_coin_id(&id("BTC")).await.unwrap(), "bitcoin");
        assert_eq!(market.coin_data(&id("btc")).await.unwrap().id, "bitcoin");
        assert_eq!(backup.calls(), 3);
    }

    #[tokio::test]
    async fn test_provider_names() {
        let market = MarketData::single(InMemoryMarketData::new());
        assert_eq!(market.provider_names(), vec!["InMemory"]);
    }
}
