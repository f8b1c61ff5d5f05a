//! Supply and capitalization snapshot with a read-through cache

use std::{collections::HashMap, sync::Arc, time::Duration};

use asset_data::{AssetCache, AssetIdentifier, MarketData, TokenomicsSnapshot};

use crate::{
    error::EngineError,
    retry::{with_retry, RetryPolicy},
};

pub struct TokenomicsResolver {
    market: MarketData,
    cache: Arc<dyn AssetCache>,
    retry: RetryPolicy,
    ttl: Duration,
    alias_ttl: Duration,
}

impl TokenomicsResolver {
    pub fn new(
        market: MarketData,
        cache: Arc<dyn AssetCache>,
        retry: RetryPolicy,
        ttl: Duration,
        alias_ttl: Duration,
    ) -> Self {
        Self {
            market,
            cache,
            retry,
            ttl,
            alias_ttl,
        }
    }

    /// Snapshot for an asset, served from the cache when fresh
    pub async fn resolve(&self, id: &AssetIdentifier) -> Result<TokenomicsSnapshot, EngineError> {
        let coin_id = self.canonical_id(id).await?;

        match self.cache.get_tokenomics(coin_id.as_str()).await {
            Ok(Some(snapshot)) => {
                tracing::debug!("Tokenomics cache hit for {}", coin_id);
                return Ok(snapshot);
            }
            Ok(None) => tracing::debug!("Tokenomics cache miss for {}", coin_id),
            Err(err) => tracing::warn!("Tokenomics cache read failed for {}: {}", coin_id, err),
        }

        let (_, snapshot) = self.fetch_and_store(&coin_id).await?;
        Ok(snapshot)
    }

    /// Fetch a fresh snapshot and overwrite the cached one.
    ///
    /// Returns the canonical coin id the snapshot was stored under.
    pub async fn refresh(
        &self,
        id: &AssetIdentifier,
    ) -> Result<(String, TokenomicsSnapshot), EngineError> {
        let coin_id = self.canonical_id(id).await?;
        self.fetch_and_store(&coin_id).await
    }

    /// Canonical coin id for a search term.
    ///
    /// Every query resolves identifiers through here, so a symbol names the
    /// same asset whichever service is asked.
    pub async fn resolve_alias(&self, id: &AssetIdentifier) -> Result<String, EngineError> {
        if let Some(coin_id) = self.cached_alias(id).await {
            return Ok(coin_id);
        }

        let coin_id = with_retry("coin id lookup", &self.retry, || {
            self.market.resolve_coin_id(id)
        })
        .await
        .map_err(|err| EngineError::from_provider(err, id.as_str()))?;

        self.remember_alias(id.as_str(), &coin_id).await;
        Ok(coin_id)
    }

    /// `resolve_alias` as an identifier the providers can be queried with
    pub async fn canonical_id(&self, id: &AssetIdentifier) -> Result<AssetIdentifier, EngineError> {
        let coin_id = self.resolve_alias(id).await?;
        Ok(AssetIdentifier::parse(&coin_id)?)
    }

    async fn fetch_and_store(
        &self,
        id: &AssetIdentifier,
    ) -> Result<(String, TokenomicsSnapshot), EngineError> {
        let coin = with_retry("market data", &self.retry, || self.market.coin_data(id))
            .await
            .map_err(|err| EngineError::from_provider(err, id.as_str()))?;

        let snapshot = TokenomicsSnapshot::from(&coin);

        if let Err(err) = self.cache.set_tokenomics(&coin.id, &snapshot, self.ttl).await {
            tracing::warn!("Failed to cache tokenomics for {}: {}", coin.id, err);
        }

        Ok((coin.id, snapshot))
    }

    async fn cached_alias(&self, id: &AssetIdentifier) -> Option<String> {
        match self.cache.get_alias(id.as_str()).await {
            Ok(alias) => alias,
            Err(err) => {
                tracing::warn!("Alias cache read failed for {}: {}", id, err);
                None
            }
        }
    }

    /// Cache `search_term → coin_id`, and the id as an alias of itself
    async fn remember_alias(&self, search_term: &str, coin_id: &str) {
        let alias = HashMap::from([
            (search_term.to_string(), coin_id.to_string()),
            (coin_id.to_lowercase(), coin_id.to_string()),
        ]);
        if let Err(err) = self.cache.set_aliases(&alias, self.alias_ttl).await {
            tracing::warn!("Failed to cache alias {} -> {}: {}", search_term, coin_id, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use asset_data::{
        provider::memory::InMemoryMarketData, CoinData, MaxSupply, MemoryCache, ProviderError,
    };

    use super::*;

    fn bitcoin() -> CoinData {
        CoinData {
            id: "bitcoin".to_string(),
            name: "Bitcoin".to_string(),
            symbol: "btc".to_string(),
            market_cap_usd: Some(1.3e12),
            volume_24h_usd: Some(3.5e10),
            circulating_supply: Some(19_700_000.0),
            total_supply: Some(21_000_000.0),
            max_supply: MaxSupply::Capped(21_000_000.0),
            ..Default::default()
        }
    }

    fn ethereum() -> CoinData {
        CoinData {
            id: "ethereum".to_string(),
            name: "Ethereum".to_string(),
            symbol: "eth".to_string(),
            market_cap_usd: Some(4.0e11),
            circulating_supply: Some(120_000_000.0),
            total_supply: None,
            max_supply: MaxSupply::Uncapped,
            ..Default::default()
        }
    }

    fn retry() -> RetryPolicy {
        RetryPolicy {
            max_retries: 1,
            base_delay: Duration::from_millis(1),
            attempt_timeout: None,
        }
    }

    fn resolver(provider: Arc<InMemoryMarketData>) -> TokenomicsResolver {
        TokenomicsResolver::new(
            MarketData::new(vec![provider]),
            Arc::new(MemoryCache::default()),
            retry(),
            Duration::from_secs(300),
            Duration::from_secs(3600),
        )
    }

    fn id(raw: &str) -> AssetIdentifier {
        AssetIdentifier::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_snapshot() {
        let resolver = resolver(Arc::new(InMemoryMarketData::new().with_coin(bitcoin())));
        let snapshot = resolver.resolve(&id("bitcoin")).await.unwrap();

        assert_eq!(snapshot.name, "Bitcoin");
        assert_eq!(snapshot.market_cap, 1.3e12);
        assert_eq!(snapshot.max_supply, MaxSupply::Capped(21_000_000.0));
    }

    #[tokio::test]
    async fn test_uncapped_supply() {
        let resolver = resolver(Arc::new(InMemoryMarketData::new().with_coin(ethereum())));
        let snapshot = resolver.resolve(&id("ethereum")).await.unwrap();

        assert_eq!(snapshot.max_supply, MaxSupply::Uncapped);
        assert_eq!(snapshot.total_supply, None);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json["max_supply"].is_null());
    }

    #[tokio::test]
    async fn test_read_through_cache() {
        let provider = Arc::new(InMemoryMarketData::new().with_coin(bitcoin()));
        let resolver = resolver(provider.clone());

        let first = resolver.resolve(&id("bitcoin")).await.unwrap();
        let calls = provider.calls();
        let second = resolver.resolve(&id("BITCOIN")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.calls(), calls);
    }

    #[tokio::test]
    async fn test_symbol_shares_canonical_entry() {
        let provider = Arc::new(InMemoryMarketData::new().with_coin(bitcoin()));
        let resolver = resolver(provider.clone());

        resolver.resolve(&id("BTC")).await.unwrap();
        let calls = provider.calls();

        // The alias now points at the cached `bitcoin` snapshot
        resolver.resolve(&id("btc")).await.unwrap();
        resolver.resolve(&id("bitcoin")).await.unwrap();
        assert_eq!(provider.calls(), calls);
        assert_eq!(resolver.resolve_alias(&id("btc")).await.unwrap(), "bitcoin");
    }

    #[tokio::test]
    async fn test_unknown_is_not_found() {
        let resolver = resolver(Arc::new(InMemoryMarketData::new().with_coin(bitcoin())));

        let err = resolver
            .resolve(&id("not-a-real-coin-xyz"))
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::NotFound("not-a-real-coin-xyz".to_string()));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_transient() {
        let provider = Arc::new(
            InMemoryMarketData::new()
                .with_coin(bitcoin())
                .failing(ProviderError::RateLimited("InMemory".to_string())),
        );
        let resolver = resolver(provider.clone());

        let err = resolver.resolve(&id("bitcoin")).await.unwrap_err();
        assert!(matches!(err, EngineError::RateLimited(_)));
        // First attempt plus one retry
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_refresh_bypasses_cache() {
        let provider = Arc::new(InMemoryMarketData::new().with_coin(bitcoin()));
        let resolver = resolver(provider.clone());

        resolver.resolve(&id("bitcoin")).await.unwrap();
        let calls = provider.calls();

        let (coin_id, _) = resolver.refresh(&id("bitcoin")).await.unwrap();
        assert_eq!(coin_id, "bitcoin");
        assert!(provider.calls() > calls);
    }
}
