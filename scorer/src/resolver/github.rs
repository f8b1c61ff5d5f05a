//! Repository activity lookup for the `github_activity` factor

use std::{sync::Arc, time::Duration};

use asset_data::{GitHubMetrics, RepoRef, RepositoryHost};
use moka::future::Cache;

use crate::{retry::with_retry, retry::RetryPolicy, scoring::RepositoryStatus};

/// Known main repositories, by canonical coin id
pub const REPO_MAPPING: &[(&str, &str, &str)] = &[
    ("bitcoin", "bitcoin", "bitcoin"),
    ("ethereum", "ethereum", "go-ethereum"),
    ("cardano", "input-output-hk", "cardano-sl"),
    ("solana", "solana-labs", "solana"),
    ("polkadot", "paritytech", "polkadot"),
    ("ripple", "XRPLF", "rippled"),
    ("dogecoin", "dogecoin", "dogecoin"),
    ("litecoin", "litecoin-project", "litecoin"),
    ("monero", "monero-project", "monero"),
    ("zcash", "zcash", "zcash"),
];

const CACHE_CAPACITY: u64 = 10_000;

/// Result of a repository lookup
#[derive(Debug, Clone, PartialEq)]
pub enum GitHubLookup {
    Tracked(GitHubMetrics),
    /// No repository on file, or the host does not know it
    NotTracked,
    /// The lookup kept failing, with the last reason
    Unavailable(String),
}

impl GitHubLookup {
    pub fn metrics(&self) -> Option<&GitHubMetrics> {
        match self {
            GitHubLookup::Tracked(metrics) => Some(metrics),
            _ => None,
        }
    }

    pub fn status(&self) -> RepositoryStatus {
        match self {
            GitHubLookup::Tracked(_) => RepositoryStatus::Tracked,
            GitHubLookup::NotTracked => RepositoryStatus::NotTracked,
            GitHubLookup::Unavailable(_) => RepositoryStatus::Unavailable,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            GitHubLookup::Unavailable(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Repository on file for a coin: the built-in mapping first, then the first
/// GitHub URL advertised by the market data provider
pub fn repository_for(coin_id: &str, repo_hints: &[String]) -> Option<RepoRef> {
    REPO_MAPPING
        .iter()
        .find(|(id, _, _)| *id == coin_id)
        .map(|(_, owner, name)| RepoRef::new(*owner, *name))
        .or_else(|| repo_hints.iter().find_map(|url| RepoRef::from_url(url)))
}

pub struct GitHubMetricsResolver {
    host: Arc<dyn RepositoryHost>,
    retry: RetryPolicy,
    cache: Option<Cache<String, GitHubLookup>>,
}

impl GitHubMetricsResolver {
    pub fn new(host: Arc<dyn RepositoryHost>, retry: RetryPolicy) -> Self {
        Self {
            host,
            retry,
            cache: None,
        }
    }

    /// Remember settled lookups for `ttl`, per canonical coin id
    pub fn with_cache(mut self, ttl: Duration) -> Self {
        self.cache = Some(
            Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(ttl)
                .build(),
        );
        self
    }

    pub async fn resolve(&self, coin_id: &str, repo_hints: &[String]) -> GitHubLookup {
        if let Some(cache) = &self.cache {
            if let Some(lookup) = cache.get(coin_id).await {
                tracing::debug!("GitHub cache hit for {}", coin_id);
                return lookup;
            }
        }

        let lookup = self.lookup(coin_id, repo_hints).await;

        // Failed lookups are retried on the next request
        if let Some(cache) = &self.cache {
            if lookup.status() != RepositoryStatus::Unavailable {
                cache.insert(coin_id.to_string(), lookup.clone()).await;
            }
        }

        lookup
    }

    async fn lookup(&self, coin_id: &str, repo_hints: &[String]) -> GitHubLookup {
        let Some(repo) = repository_for(coin_id, repo_hints) else {
            tracing::debug!("No repository on file for {}", coin_id);
            return GitHubLookup::NotTracked;
        };

        let result = with_retry("GitHub lookup", &self.retry, || {
            self.host.repository_metrics(&repo)
        })
        .await;

        match result {
            Ok(Some(metrics)) => GitHubLookup::Tracked(metrics),
            Ok(None) => {
                tracing::info!(
                    "Repository {}/{} for {} not found on GitHub",
                    repo.owner,
                    repo.name,
                    coin_id
                );
                GitHubLookup::NotTracked
            }
            Err(err) => {
                tracing::warn!(
                    "GitHub metrics unavailable for {} ({}/{}): {}",
                    coin_id,
                    repo.owner,
                    repo.name,
                    err
                );
                GitHubLookup::Unavailable(err.to_string())
            }
        }
    }
}
