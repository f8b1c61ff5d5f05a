use std::{env, sync::Arc};

pub mod cache;
pub mod entity;
pub mod error;
pub mod provider;

// Re-export commonly used types
pub use cache::{AssetCache, CacheStats, MemoryCache, RedisCache};
pub use entity::{
    AssetIdentifier, CoinData, CoinListing, GitHubMetrics, IdentifierError, MaxSupply, RepoRef,
    TokenomicsSnapshot,
};
pub use error::ProviderError;
pub use provider::{
    coingecko::CoinGeckoProvider, github::GitHubClient, MarketData, MarketDataProvider,
    RepositoryHost,
};

mod defaults {
    pub const CACHE_MAX_ENTRIES: &str = "10000";
}

/// Load a `.env` file if present
pub fn load_env() {
    dotenvy::dotenv().ok();
}

/// Connect the shared cache.
///
/// Uses Redis when `REDIS_URL` is set and reachable, otherwise an in-process
/// TTL cache so the services keep working without Redis.
pub async fn initialize_cache() -> Arc<dyn AssetCache> {
    load_env();

    let max_entries = env::var("CACHE_MAX_ENTRIES")
        .unwrap_or(String::from(defaults::CACHE_MAX_ENTRIES))
        .parse::<u64>()
        .unwrap_or(10_000);

    match env::var("REDIS_URL") {
        Ok(redis_url) => match RedisCache::new(&redis_url).await {
            Ok(cache) => Arc::new(cache),
            Err(err) => {
                tracing::warn!("Redis unavailable ({err}), falling back to in-process cache");
                Arc::new(MemoryCache::new(max_entries))
            }
        },
        Err(_) => {
            tracing::info!("REDIS_URL not set, using in-process cache");
            Arc::new(MemoryCache::new(max_entries))
        }
    }
}
