use std::sync::Arc;

use asset_data::{
    initialize_cache, load_env, AssetCache, CoinGeckoProvider, GitHubClient, MarketData,
    RepositoryHost,
};

use crate::{
    config::EngineConfig,
    error::EngineError,
    resolver::{GitHubMetricsResolver, TokenomicsResolver},
    scoring::ScoreAggregator,
    service::{ScoreService, TokenomicsService},
    updater::CacheUpdater,
};

/// Fully wired services sharing one market data chain and one cache
#[derive(Clone)]
pub struct Engine {
    pub score: ScoreService,
    pub tokenomics: TokenomicsService,
    pub updater: Arc<CacheUpdater>,
    pub market: MarketData,
    pub cache: Arc<dyn AssetCache>,
}

impl Engine {
    pub fn build(
        config: EngineConfig,
        market: MarketData,
        host: Arc<dyn RepositoryHost>,
        cache: Arc<dyn AssetCache>,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let mut github = GitHubMetricsResolver::new(host, config.github_retry());
        if let Some(ttl) = config.github_cache_ttl {
            github = github.with_cache(ttl);
        }

        let aggregator = ScoreAggregator::new(
            market.clone(),
            github,
            config.weights,
            config.normalization,
            config.retry,
        );

        let resolver = Arc::new(TokenomicsResolver::new(
            market.clone(),
            cache.clone(),
            config.retry,
            config.tokenomics_ttl,
            config.alias_ttl,
        ));

        let updater = CacheUpdater::new(
            resolver.clone(),
            market.clone(),
            cache.clone(),
            config.alias_ttl,
        );

        Ok(Self {
            score: ScoreService::new(Arc::new(aggregator), resolver.clone()),
            tokenomics: TokenomicsService::new(resolver),
            updater: Arc::new(updater),
            market,
            cache,
        })
    }

    /// CoinGecko market data, GitHub metrics and the shared cache, configured
    /// from the environment
    pub async fn from_env() -> Result<Self, EngineError> {
        load_env();

        let config = EngineConfig::from_env()?;

        let coingecko = CoinGeckoProvider::from_env()
            .map_err(|err| EngineError::InvalidConfig(err.to_string()))?;
        let github =
            GitHubClient::from_env().map_err(|err| EngineError::InvalidConfig(err.to_string()))?;

        let market = MarketData::single(coingecko);
        tracing::info!("Market data providers: {:?}", market.provider_names());

        let cache = initialize_cache().await;
        tracing::info!("Cache backend: {}", cache.backend());

        Self::build(config, market, Arc::new(github), cache)
    }
}
