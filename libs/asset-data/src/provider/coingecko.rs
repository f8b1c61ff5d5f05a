//! CoinGecko market data provider

use std::{collections::HashMap, env, time::Duration};

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;

use crate::{
    entity::{AssetIdentifier, CoinData, CoinListing, MaxSupply},
    error::ProviderError,
};

use super::MarketDataProvider;

mod defaults {
    pub const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";
    pub const HTTP_TIMEOUT_MS: &str = "5000";
    /// Resolved query → id mappings rarely change
    pub const ID_CACHE_TTL_SECS: u64 = 86_400;
    pub const ID_CACHE_CAPACITY: u64 = 10_000;
}

const PROVIDER_NAME: &str = "CoinGecko";

/// `/coins/{id}` response, only the fields we use
#[derive(Debug, Deserialize)]
struct CoinResponse {
    id: String,
    name: String,
    symbol: String,
    #[serde(default)]
    market_data: Option<MarketDataResponse>,
    #[serde(default)]
    links: Option<LinksResponse>,
}

#[derive(Debug, Default, Deserialize)]
struct MarketDataResponse {
    #[serde(default)]
    market_cap: HashMap<String, Option<f64>>,
    #[serde(default)]
    total_volume: HashMap<String, Option<f64>>,
    circulating_supply: Option<f64>,
    total_supply: Option<f64>,
    max_supply: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct LinksResponse {
    #[serde(default)]
    repos_url: ReposResponse,
}

#[derive(Debug, Default, Deserialize)]
struct ReposResponse {
    #[serde(default)]
    github: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    coins: Vec<SearchCoin>,
}

#[derive(Debug, Deserialize)]
struct SearchCoin {
    id: String,
}

impl From<CoinResponse> for CoinData {
    fn from(coin: CoinResponse) -> Self {
        let market = coin.market_data.unwrap_or_default();
        let usd = |values: &HashMap<String, Option<f64>>| values.get("usd").copied().flatten();

        let github_repos = coin
            .links
            .map(|links| {
                links
                    .repos_url
                    .github
                    .into_iter()
                    .filter(|url| !url.trim().is_empty())
                    .collect()
            })
            .unwrap_or_default();

        CoinData {
            id: coin.id,
            name: coin.name,
            symbol: coin.symbol,
            market_cap_usd: usd(&market.market_cap),
            volume_24h_usd: usd(&market.total_volume),
            circulating_supply: market.circulating_supply,
            total_supply: market.total_supply,
            max_supply: MaxSupply::from(market.max_supply),
            github_repos,
            // Not published by CoinGecko
            top_holder_concentration: None,
        }
    }
}

/// CoinGecko public API client
pub struct CoinGeckoProvider {
    client: Client,
    base_url: Url,
    /// Search query → coin id, avoids repeated `/search` calls
    id_cache: Cache<String, String>,
}

impl CoinGeckoProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ProviderError::Http(format!("invalid CoinGecko URL `{base_url}`: {e}")))?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("asset-data/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let id_cache = Cache::builder()
            .max_capacity(defaults::ID_CACHE_CAPACITY)
            .time_to_live(Duration::from_secs(defaults::ID_CACHE_TTL_SECS))
            .build();

        Ok(Self {
            client,
            base_url,
            id_cache,
        })
    }

    /// Build from `COINGECKO_BASE_URL` and `HTTP_TIMEOUT_MS`
    pub fn from_env() -> Result<Self, ProviderError> {
        let base_url = env::var("COINGECKO_BASE_URL")
            .unwrap_or_else(|_| defaults::COINGECKO_BASE_URL.to_string());

        let timeout_ms = env::var("HTTP_TIMEOUT_MS")
            .unwrap_or_else(|_| defaults::HTTP_TIMEOUT_MS.to_string())
            .parse::<u64>()
            .unwrap_or(5000);

        Self::new(&base_url, Duration::from_millis(timeout_ms))
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::Http(format!("`{}` cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, url: Url, query: &[(&str, &str)]) -> Result<Response, ProviderError> {
        Ok(self.client.get(url).query(query).send().await?)
    }

    /// Direct lookup: the query already is a coin id
    async fn lookup_id(&self, query: &str) -> Result<Option<String>, ProviderError> {
        let url = self.endpoint(&["coins", query])?;
        let response = self
            .get(
                url,
                &[
                    ("localization", "false"),
                    ("tickers", "false"),
                    ("market_data", "false"),
                    ("community_data", "false"),
                    ("developer_data", "false"),
                ],
            )
            .await?;

        match response.status() {
            status if status.is_success() => {
                let coin: CoinResponse = response.json().await?;
                Ok(Some(coin.id))
            }
            StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => Ok(None),
            StatusCode::TOO_MANY_REQUESTS => {
                tracing::warn!("[RATE LIMIT] 429 from CoinGecko /coins for query: {query}");
                Err(ProviderError::RateLimited(PROVIDER_NAME.to_string()))
            }
            status => Err(ProviderError::Http(format!(
                "CoinGecko /coins/{query} returned {status}"
            ))),
        }
    }

    /// Search lookup: first (most relevant) hit for a symbol or name
    async fn search_id(&self, query: &str) -> Result<Option<String>, ProviderError> {
        let url = self.endpoint(&["search"])?;
        let response = self.get(url, &[("query", query)]).await?;
        check_status(&response, query)?;

        let search: SearchResponse = response.json().await?;
        Ok(search.coins.into_iter().next().map(|coin| coin.id))
    }
}

/// Map non-success statuses to provider errors
fn check_status(response: &Response, subject: &str) -> Result<(), ProviderError> {
    match response.status() {
        status if status.is_success() => Ok(()),
        StatusCode::NOT_FOUND => Err(ProviderError::NotFound(subject.to_string())),
        StatusCode::TOO_MANY_REQUESTS => {
            tracing::warn!("[RATE LIMIT] 429 from CoinGecko for {subject}");
            Err(ProviderError::RateLimited(PROVIDER_NAME.to_string()))
        }
        status => Err(ProviderError::Http(format!(
            "CoinGecko returned {status} for {subject}"
        ))),
    }
}

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn resolve_coin_id(&self, query: &AssetIdentifier) -> Result<String, ProviderError> {
        if let Some(coin_id) = self.id_cache.get(query.as_str()).await {
            return Ok(coin_id);
        }

        let resolved = match self.lookup_id(query.as_str()).await? {
            Some(coin_id) => Some(coin_id),
            None => self.search_id(query.as_str()).await?,
        };

        match resolved {
            Some(coin_id) => {
                self.id_cache
                    .insert(query.as_str().to_string(), coin_id.clone())
                    .await;
                // Canonical ids are looked up again when their data is fetched
                self.id_cache.insert(coin_id.clone(), coin_id.clone()).await;
                Ok(coin_id)
            }
            None => Err(ProviderError::NotFound(query.to_string())),
        }
    }

    async fn coin_data(&self, coin_id: &str) -> Result<CoinData, ProviderError> {
        let url = self.endpoint(&["coins", coin_id])?;
        let response = self
            .get(
                url,
                &[
                    ("localization", "false"),
                    ("tickers", "false"),
                    ("community_data", "false"),
                    ("developer_data", "false"),
                    ("sparkline", "false"),
                ],
            )
            .await?;
        check_status(&response, coin_id)?;

        let coin: CoinResponse = response.json().await?;
        Ok(coin.into())
    }

    async fn coins_list(&self) -> Result<Vec<CoinListing>, ProviderError> {
        let url = self.endpoint(&["coins", "list"])?;
        let response = self.get(url, &[]).await?;
        check_status(&response, "coins list")?;

        let coins: Vec<CoinListing> = response.json().await?;
        tracing::info!("Retrieved {} coins from CoinGecko", coins.len());
        Ok(coins)
    }

    async fn check_health(&self) -> bool {
        let Ok(url) = self.endpoint(&["ping"]) else {
            return false;
        };

        match self.get(url, &[]).await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
