//! Cache warming: refresh tokenomics and the alias table ahead of requests

use std::{collections::HashMap, sync::Arc, time::Duration};

use asset_data::{AssetCache, AssetIdentifier, CacheStats, CoinListing, MarketData};
use serde::Serialize;

use crate::{error::EngineError, resolver::TokenomicsResolver};

/// Coins kept warm by default, most requested first
pub const POPULAR_COINS: [&str; 20] = [
    "bitcoin",
    "ethereum",
    "tether",
    "binancecoin",
    "solana",
    "usd-coin",
    "ripple",
    "cardano",
    "avalanche-2",
    "dogecoin",
    "polkadot",
    "tron",
    "chainlink",
    "polygon",
    "litecoin",
    "near",
    "uniswap",
    "internet-computer",
    "cosmos",
    "stellar",
];

#[derive(Debug, Clone, Serialize)]
pub struct CoinUpdate {
    pub coin_id: String,
    pub tokenomics_updated: bool,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchUpdate {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<CoinUpdate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AliasUpdate {
    pub success: bool,
    pub aliases_updated: usize,
    pub coins_processed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct CacheUpdater {
    tokenomics: Arc<TokenomicsResolver>,
    market: MarketData,
    cache: Arc<dyn AssetCache>,
    alias_ttl: Duration,
}

impl CacheUpdater {
    pub fn new(
        tokenomics: Arc<TokenomicsResolver>,
        market: MarketData,
        cache: Arc<dyn AssetCache>,
        alias_ttl: Duration,
    ) -> Self {
        Self {
            tokenomics,
            market,
            cache,
            alias_ttl,
        }
    }

    /// Force-refresh the cached tokenomics of one coin (id, symbol or name)
    pub async fn update_coin(&self, coin_id: &str) -> CoinUpdate {
        tracing::info!("[CacheUpdater] Updating tokenomics for {}", coin_id);

        let result = match AssetIdentifier::parse(coin_id) {
            Ok(id) => self.tokenomics.refresh(&id).await,
            Err(err) => Err(EngineError::from(err)),
        };

        match result {
            Ok((canonical_id, _)) => {
                tracing::info!("[CacheUpdater] Updated cache for {}", canonical_id);
                CoinUpdate {
                    coin_id: coin_id.to_string(),
                    tokenomics_updated: true,
                    errors: Vec::new(),
                }
            }
            Err(err) => {
                tracing::warn!("[CacheUpdater] Failed to update {}: {}", coin_id, err);
                CoinUpdate {
                    coin_id: coin_id.to_string(),
                    tokenomics_updated: false,
                    errors: vec![err.to_string()],
                }
            }
        }
    }

    pub async fn update_coins<S: AsRef<str>>(&self, coin_ids: &[S]) -> BatchUpdate {
        tracing::info!("[CacheUpdater] Starting batch update for {} coins", coin_ids.len());

        let mut results = Vec::with_capacity(coin_ids.len());
        for coin_id in coin_ids {
            results.push(self.update_coin(coin_id.as_ref()).await);
        }

        let succeeded = results.iter().filter(|r| r.tokenomics_updated).count();
        let summary = BatchUpdate {
            total: coin_ids.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        };

        tracing::info!(
            "[CacheUpdater] Batch update complete: {} succeeded, {} failed",
            summary.succeeded,
            summary.failed
        );
        summary
    }

    /// Refresh the first `limit` popular coins
    pub async fn update_popular(&self, limit: usize) -> BatchUpdate {
        let coins = &POPULAR_COINS[..limit.min(POPULAR_COINS.len())];
        self.update_coins(coins).await
    }

    /// Rebuild the alias table (id, symbol and name → id) from the full coin list
    pub async fn update_aliases(&self) -> AliasUpdate {
        tracing::info!("[CacheUpdater] Fetching coins list for alias update");

        let coins = match self.market.coins_list().await {
            Ok(coins) => coins,
            Err(err) => {
                tracing::error!("[CacheUpdater] Alias update failed: {}", err);
                return AliasUpdate {
                    success: false,
                    aliases_updated: 0,
                    coins_processed: 0,
                    error: Some(err.to_string()),
                };
            }
        };

        let aliases = alias_table(&coins);

        match self.cache.set_aliases(&aliases, self.alias_ttl).await {
            Ok(aliases_updated) => AliasUpdate {
                success: true,
                aliases_updated,
                coins_processed: coins.len(),
                error: None,
            },
            Err(err) => {
                tracing::error!("[CacheUpdater] Failed to store aliases: {}", err);
                AliasUpdate {
                    success: false,
                    aliases_updated: 0,
                    coins_processed: coins.len(),
                    error: Some(err.to_string()),
                }
            }
        }
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }
}

/// Lower-cased search terms → canonical id.
///
/// A symbol or name listed by more than one coin is left out, so those terms
/// keep resolving through the provider's search. An id always maps to itself.
fn alias_table(coins: &[CoinListing]) -> HashMap<String, String> {
    let mut owners: HashMap<String, Option<&str>> = HashMap::with_capacity(coins.len() * 2);

    for coin in coins {
        for term in [&coin.symbol, &coin.name] {
            let term = term.trim().to_lowercase();
            if term.is_empty() {
                continue;
            }
            owners
                .entry(term)
                .and_modify(|owner| {
                    if *owner != Some(coin.id.as_str()) {
                        *owner = None;
                    }
                })
                .or_insert(Some(coin.id.as_str()));
        }
    }

    let mut aliases: HashMap<String, String> = owners
        .into_iter()
        .filter_map(|(term, owner)| owner.map(|coin_id| (term, coin_id.to_string())))
        .collect();

    for coin in coins {
        aliases.insert(coin.id.to_lowercase(), coin.id.clone());
    }

    aliases
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(id: &str, symbol: &str, name: &str) -> CoinListing {
        CoinListing {
            id: id.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_alias_table() {
        let coins = vec![
            listing("bitcoin", "btc", "Bitcoin"),
            listing("batcat", "btc", "BatCat"),
            listing("ethereum", "eth", "Ethereum"),
        ];
        let aliases = alias_table(&coins);

        assert_eq!(aliases["bitcoin"], "bitcoin");
        assert_eq!(aliases["batcat"], "batcat");
        assert_eq!(aliases["eth"], "ethereum");
        assert_eq!(aliases.len(), 4);
    }

    #[test]
    fn test_shared_symbol_is_left_to_search() {
        let coins = vec![
            listing("batcat", "btc", "BatCat"),
            listing("bitcoin", "btc", "Bitcoin"),
            listing("tether", "usdt", "Tether"),
            listing("tether-eurt", "eurt", "Tether"),
        ];
        let aliases = alias_table(&coins);

        assert!(!aliases.contains_key("btc"));
        assert_eq!(aliases["tether"], "tether");
        assert_eq!(aliases["usdt"], "tether");
        assert_eq!(aliases["eurt"], "tether-eurt");
    }

    #[test]
    fn test_id_wins_over_other_coins_name() {
        // A coin named like another coin's id must not hijack that id
        let coins = vec![
            listing("fake-token", "fk", "solana"),
            listing("solana", "sol", "Solana"),
        ];
        assert_eq!(alias_table(&coins)["solana"], "solana");
    }

    #[test]
    fn test_popular_list() {
        assert_eq!(POPULAR_COINS.len(), 20);
        assert_eq!(POPULAR_COINS[0], "bitcoin");
    }
}
