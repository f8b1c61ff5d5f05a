//! Read-through cache for tokenomics snapshots and coin aliases

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use moka::{future::Cache, Expiry};
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use serde::Serialize;

use crate::{entity::TokenomicsSnapshot, error::ProviderError};

/// Cache key layout shared by every backend
pub mod keys {
    pub fn tokenomics(coin_id: &str) -> String {
        format!("crypto:tokenomics:{}", coin_id.to_lowercase())
    }

    pub fn alias(search_term: &str) -> String {
        format!("crypto:alias:{}", search_term.trim().to_lowercase())
    }
}

/// Cache health and size
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub backend: &'static str,
    pub connected: bool,
    pub total_keys: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_memory_human: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[async_trait]
pub trait AssetCache: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn get_tokenomics(
        &self,
        coin_id: &str,
    ) -> Result<Option<TokenomicsSnapshot>, ProviderError>;

    async fn set_tokenomics(
        &self,
        coin_id: &str,
        snapshot: &TokenomicsSnapshot,
        ttl: Duration,
    ) -> Result<(), ProviderError>;

    /// Canonical coin id for a search term (id, symbol or name)
    async fn get_alias(&self, search_term: &str) -> Result<Option<String>, ProviderError>;

    /// Store alias mappings, returns how many were written
    async fn set_aliases(
        &self,
        aliases: &HashMap<String, String>,
        ttl: Duration,
    ) -> Result<usize, ProviderError>;

    async fn stats(&self) -> CacheStats;
}

/// Redis-backed cache shared between the API and the updater
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    pub async fn new(redis_url: &str) -> Result<Self, ProviderError> {
        let client = Client::open(redis_url)?;
        let mut connection = client.get_connection_manager().await?;

        let _: String = redis::cmd("PING").query_async(&mut connection).await?;
        tracing::info!("Connected to Redis");

        Ok(Self { connection })
    }
}

#[async_trait]
impl AssetCache for RedisCache {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn get_tokenomics(
        &self,
        coin_id: &str,
    ) -> Result<Option<TokenomicsSnapshot>, ProviderError> {
        let mut connection = self.connection.clone();
        let raw: Option<String> = connection.get(keys::tokenomics(coin_id)).await?;

        match raw {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    async fn set_tokenomics(
        &self,
        coin_id: &str,
        snapshot: &TokenomicsSnapshot,
        ttl: Duration,
    ) -> Result<(), ProviderError> {
        let payload = serde_json::to_string(snapshot)?;
        let mut connection = self.connection.clone();
        connection
            .set_ex::<_, _, ()>(keys::tokenomics(coin_id), payload, ttl.as_secs().max(1))
            .await?;

        tracing::debug!("Cached tokenomics for {} (TTL: {}s)", coin_id, ttl.as_secs());
        Ok(())
    }

    async fn get_alias(&self, search_term: &str) -> Result<Option<String>, ProviderError> {
        let mut connection = self.connection.clone();
        Ok(connection.get(keys::alias(search_term)).await?)
    }

    async fn set_aliases(
        &self,
        aliases: &HashMap<String, String>,
        ttl: Duration,
    ) -> Result<usize, ProviderError> {
        if aliases.is_empty() {
            return Ok(0);
        }

        let mut pipe = redis::pipe();
        for (search_term, coin_id) in aliases {
            pipe.set_ex(keys::alias(search_term), coin_id, ttl.as_secs().max(1))
                .ignore();
        }

        let mut connection = self.connection.clone();
        let _: () = pipe.query_async(&mut connection).await?;

        tracing::info!("Bulk set {} aliases", aliases.len());
        Ok(aliases.len())
    }

    async fn stats(&self) -> CacheStats {
        let mut connection = self.connection.clone();

        let total_keys: Result<u64, _> = redis::cmd("DBSIZE").query_async(&mut connection).await;
        let info: Result<String, _> = redis::cmd("INFO")
            .arg("memory")
            .query_async(&mut connection)
            .await;

        match (total_keys, info) {
            (Ok(total_keys), Ok(info)) => CacheStats {
                backend: self.backend(),
                connected: true,
                total_keys: Some(total_keys),
                used_memory_human: parse_info_field(&info, "used_memory_human"),
                error: None,
            },
            (Err(err), _) | (_, Err(err)) => CacheStats {
                backend: self.backend(),
                connected: false,
                total_keys: None,
                used_memory_human: None,
                error: Some(err.to_string()),
            },
        }
    }
}

/// Value of `field` in a Redis `INFO` reply
fn parse_info_field(info: &str, field: &str) -> Option<String> {
    info.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        (key == field).then(|| value.trim().to_string())
    })
}

/// Per-entry TTL for the in-process cache
struct EntryTtl;

impl<V> Expiry<String, (V, Duration)> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &(V, Duration),
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.1)
    }
}

/// In-process cache used when Redis is not configured
pub struct MemoryCache {
    tokenomics: Cache<String, (TokenomicsSnapshot, Duration)>,
    aliases: Cache<String, (String, Duration)>,
}

impl MemoryCache {
    pub fn new(max_entries: u64) -> Self {
        Self {
            tokenomics: Cache::builder()
                .max_capacity(max_entries)
                .expire_after(EntryTtl)
                .build(),
            aliases: Cache::builder()
                .max_capacity(max_entries)
                .expire_after(EntryTtl)
                .build(),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl AssetCache for MemoryCache {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get_tokenomics(
        &self,
        coin_id: &str,
    ) -> Result<Option<TokenomicsSnapshot>, ProviderError> {
        Ok(self
            .tokenomics
            .get(&keys::tokenomics(coin_id))
            .await
            .map(|(snapshot, _)| snapshot))
    }

    async fn set_tokenomics(
        &self,
        coin_id: &str,
        snapshot: &TokenomicsSnapshot,
        ttl: Duration,
    ) -> Result<(), ProviderError> {
        self.tokenomics
            .insert(keys::tokenomics(coin_id), (snapshot.clone(), ttl))
            .await;
        Ok(())
    }

    async fn get_alias(&self, search_term: &str) -> Result<Option<String>, ProviderError> {
        Ok(self
            .aliases
            .get(&keys::alias(search_term))
            .await
            .map(|(coin_id, _)| coin_id))
    }

    async fn set_aliases(
        &self,
        aliases: &HashMap<String, String>,
        ttl: Duration,
    ) -> Result<usize, ProviderError> {
        for (search_term, coin_id) in aliases {
            self.aliases
                .insert(keys::alias(search_term), (coin_id.clone(), ttl))
                .await;
        }
        Ok(aliases.len())
    }

    async fn stats(&self) -> CacheStats {
        self.tokenomics.run_pending_tasks().await;
        self.aliases.run_pending_tasks().await;

        CacheStats {
            backend: self.backend(),
            connected: true,
            total_keys: Some(self.tokenomics.entry_count() + self.aliases.entry_count()),
            used_memory_human: None,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::MaxSupply;

    fn snapshot() -> TokenomicsSnapshot {
        TokenomicsSnapshot {
            name: "Bitcoin".to_string(),
            symbol: "btc".to_string(),
            market_cap: 1.3e12,
            circulating_supply: Some(19_700_000.0),
            total_supply: Some(21_000_000.0),
            max_supply: MaxSupply::Capped(21_000_000.0),
        }
    }

    #[test]
    fn test_key_layout() {
        assert_eq!(keys::tokenomics("Bitcoin"), "crypto:tokenomics:bitcoin");
        assert_eq!(keys::alias(" BTC "), "crypto:alias:btc");
    }

    #[test]
    fn test_parse_info_field() {
        let info = "# Memory\r\nused_memory:1024\r\nused_memory_human:1.00K\r\n";
        assert_eq!(
            parse_info_field(info, "used_memory_human"),
            Some("1.00K".to_string())
        );
        assert_eq!(parse_info_field(info, "missing"), None);
    }

    #[tokio::test]
    async fn test_memory_cache_tokenomics() {
        let cache = MemoryCache::default();
        assert_eq!(cache.get_tokenomics("bitcoin").await.unwrap(), None);

        cache
            .set_tokenomics("bitcoin", &snapshot(), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(
            cache.get_tokenomics("bitcoin").await.unwrap(),
            Some(snapshot())
        );
        // Keys are per asset
        assert_eq!(cache.get_tokenomics("ethereum").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_cache_entries_expire() {
        let cache = MemoryCache::default();
        cache
            .set_tokenomics("bitcoin", &snapshot(), Duration::from_millis(20))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(cache.get_tokenomics("bitcoin").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_cache_aliases() {
        let cache = MemoryCache::default();
        let aliases = HashMap::from([
            ("btc".to_string(), "bitcoin".to_string()),
            ("Bitcoin".to_string(), "bitcoin".to_string()),
        ]);

        let written = cache
            .set_aliases(&aliases, Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(written, 2);

        assert_eq!(
            cache.get_alias("BTC").await.unwrap(),
            Some("bitcoin".to_string())
        );
        assert_eq!(
            cache.get_alias("bitcoin").await.unwrap(),
            Some("bitcoin".to_string())
        );
        assert_eq!(cache.get_alias("eth").await.unwrap(), None);

        let stats = cache.stats().await;
        assert_eq!(stats.backend, "memory");
        assert_eq!(stats.total_keys, Some(2));
    }
}
