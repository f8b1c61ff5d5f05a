//! In-process data sources backed by fixed tables.
//!
//! Useful for local runs without network access and for exercising the
//! services deterministically.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    entity::{AssetIdentifier, CoinData, CoinListing, GitHubMetrics, RepoRef},
    error::ProviderError,
};

use super::{MarketDataProvider, RepositoryHost};

/// Market data served from a fixed table of coins
#[derive(Default)]
pub struct InMemoryMarketData {
    coins: HashMap<String, CoinData>,
    aliases: HashMap<String, String>,
    failure: Option<ProviderError>,
    calls: AtomicUsize,
}

impl InMemoryMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a coin, reachable by its id, symbol and name
    pub fn with_coin(mut self, coin: CoinData) -> Self {
        for alias in [&coin.id, &coin.symbol, &coin.name] {
            if !alias.is_empty() {
                self.aliases
                    .entry(alias.to_lowercase())
                    .or_insert_with(|| coin.id.clone());
            }
        }
        self.aliases.insert(coin.id.to_lowercase(), coin.id.clone());
        self.coins.insert(coin.id.clone(), coin);
        self
    }

    /// Make every call fail with `err`
    pub fn failing(mut self, err: ProviderError) -> Self {
        self.failure = Some(err);
        self
    }

    /// Number of lookups served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) -> Result<(), ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MarketDataProvider for InMemoryMarketData {
    fn name(&self) -> &'static str {
        "InMemory"
    }

    async fn resolve_coin_id(&self, query: &AssetIdentifier) -> Result<String, ProviderError> {
        self.record_call()?;
        self.aliases
            .get(query.as_str())
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(query.to_string()))
    }

    async fn coin_data(&self, coin_id: &str) -> Result<CoinData, ProviderError> {
        self.record_call()?;
        self.coins
            .get(coin_id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(coin_id.to_string()))
    }

    async fn coins_list(&self) -> Result<Vec<CoinListing>, ProviderError> {
        self.record_call()?;
        let mut coins: Vec<CoinListing> = self
            .coins
            .values()
            .map(|coin| CoinListing {
                id: coin.id.clone(),
                symbol: coin.symbol.clone(),
                name: coin.name.clone(),
            })
            .collect();
        coins.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(coins)
    }

    async fn check_health(&self) -> bool {
        self.failure.is_none()
    }
}

/// Repository metrics served from a fixed table.
///
/// Can simulate slow responses and a number of transient failures before
/// answering.
#[derive(Default)]
pub struct InMemoryRepositoryHost {
    repos: HashMap<RepoRef, GitHubMetrics>,
    failure: Option<ProviderError>,
    failures_remaining: Mutex<Option<usize>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl InMemoryRepositoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repo(mut self, repo: RepoRef, metrics: GitHubMetrics) -> Self {
        self.repos.insert(repo, metrics);
        self
    }

    /// Fail every call with `err`
    pub fn failing(mut self, err: ProviderError) -> Self {
        self.failure = Some(err);
        self.failures_remaining = Mutex::new(None);
        self
    }

    /// Fail the first `times` calls with `err`, then answer normally
    pub fn failing_times(mut self, err: ProviderError, times: usize) -> Self {
        self.failure = Some(err);
        self.failures_remaining = Mutex::new(Some(times));
        self
    }

    /// Sleep before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_failure(&self) -> Option<ProviderError> {
        let failure = self.failure.as_ref()?;
        let mut remaining = self
            .failures_remaining
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match remaining.as_mut() {
            None => Some(failure.clone()),
            Some(0) => None,
            Some(n) => {
                *n -= 1;
                Some(failure.clone())
            }
        }
    }
}

#[async_trait]
impl RepositoryHost for InMemoryRepositoryHost {
    async fn repository_metrics(
        &self,
        repo: &RepoRef,
    ) -> Result<Option<GitHubMetrics>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.next_failure() {
            return Err(err);
        }

        Ok(self.repos.get(repo).cloned())
    }
}
