use std::{env, str::FromStr, time::Duration};

use crate::{
    error::EngineError,
    retry::RetryPolicy,
    scoring::{FactorWeights, LogScale, NormalizationConfig},
};

mod defaults {
    pub const MAX_RETRIES: &str = "3";
    pub const RETRY_DELAY_MS: &str = "500";
    pub const GITHUB_TIMEOUT_MS: &str = "5000";
    pub const GITHUB_CACHE_TTL_SECS: &str = "3600";
    pub const TOKENOMICS_CACHE_TTL_SECS: &str = "300";
    pub const ALIAS_CACHE_TTL_SECS: &str = "604800";
    pub const DEFAULT_HOLDER_CONCENTRATION: &str = "0.15";
    pub const MARKET_CAP_FLOOR_USD: &str = "1000000";
    pub const MARKET_CAP_CEILING_USD: &str = "10000000000";
    pub const VOLUME_FLOOR_USD: &str = "100000";
    pub const VOLUME_CEILING_USD: &str = "1000000000";
}

/// Scoring and caching settings
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub weights: FactorWeights,
    pub normalization: NormalizationConfig,
    /// Retries for market data and repository lookups
    pub retry: RetryPolicy,
    /// Bound on a single GitHub lookup attempt
    pub github_timeout: Duration,
    /// `None` disables the GitHub lookup cache
    pub github_cache_ttl: Option<Duration>,
    pub tokenomics_ttl: Duration,
    pub alias_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: FactorWeights::default(),
            normalization: NormalizationConfig::default(),
            retry: RetryPolicy::default(),
            github_timeout: Duration::from_millis(5000),
            github_cache_ttl: Some(Duration::from_secs(3600)),
            tokenomics_ttl: Duration::from_secs(300),
            alias_ttl: Duration::from_secs(604_800),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: &str) -> Result<T, EngineError> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|_| EngineError::InvalidConfig(format!("`{key}` has invalid value `{raw}`")))
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, EngineError> {
        let github_cache_secs: u64 =
            env_or("GITHUB_CACHE_TTL_SECS", defaults::GITHUB_CACHE_TTL_SECS)?;

        let config = Self {
            weights: FactorWeights::default(),
            normalization: NormalizationConfig {
                market_cap: LogScale::new(
                    env_or("MARKET_CAP_FLOOR_USD", defaults::MARKET_CAP_FLOOR_USD)?,
                    env_or("MARKET_CAP_CEILING_USD", defaults::MARKET_CAP_CEILING_USD)?,
                ),
                volume: LogScale::new(
                    env_or("VOLUME_FLOOR_USD", defaults::VOLUME_FLOOR_USD)?,
                    env_or("VOLUME_CEILING_USD", defaults::VOLUME_CEILING_USD)?,
                ),
                default_holder_concentration: env_or(
                    "DEFAULT_HOLDER_CONCENTRATION",
                    defaults::DEFAULT_HOLDER_CONCENTRATION,
                )?,
                ..NormalizationConfig::default()
            },
            retry: RetryPolicy {
                max_retries: env_or("MAX_RETRIES", defaults::MAX_RETRIES)?,
                base_delay: Duration::from_millis(env_or(
                    "RETRY_DELAY_MS",
                    defaults::RETRY_DELAY_MS,
                )?),
                attempt_timeout: None,
            },
            github_timeout: Duration::from_millis(env_or(
                "GITHUB_TIMEOUT_MS",
                defaults::GITHUB_TIMEOUT_MS,
            )?),
            // 0 disables the cache
            github_cache_ttl: (github_cache_secs > 0)
                .then(|| Duration::from_secs(github_cache_secs)),
            tokenomics_ttl: Duration::from_secs(env_or(
                "TOKENOMICS_CACHE_TTL_SECS",
                defaults::TOKENOMICS_CACHE_TTL_SECS,
            )?),
            alias_ttl: Duration::from_secs(env_or(
                "ALIAS_CACHE_TTL_SECS",
                defaults::ALIAS_CACHE_TTL_SECS,
            )?),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        self.weights.validate()?;
        self.normalization.validate()?;

        if self.github_timeout.is_zero() {
            return Err(EngineError::InvalidConfig(
                "`GITHUB_TIMEOUT_MS` must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Retry policy for GitHub, with the per-attempt timeout applied
    pub fn github_retry(&self) -> RetryPolicy {
        self.retry.with_attempt_timeout(self.github_timeout)
    }
}
