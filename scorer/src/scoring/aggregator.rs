//! Composite score over the factor table

use asset_data::{AssetIdentifier, MarketData};

use crate::{
    error::EngineError,
    resolver::{GitHubLookup, GitHubMetricsResolver},
    retry::{with_retry, RetryPolicy},
};

use super::{
    breakdown::{Breakdown, FactorResult, ScoreBreakdown},
    normalize::{
        normalize_github_activity, normalize_holder_diversity, normalize_market_cap,
        normalize_volume, NormalizationConfig,
    },
    weights::{Factor, FactorWeights},
};

/// Raw inputs for one asset, as reported by the data sources
#[derive(Debug, Clone, PartialEq)]
pub struct RawSignals {
    pub market_cap: Option<f64>,
    pub volume_24h: Option<f64>,
    pub holder_concentration: Option<f64>,
    pub github: GitHubLookup,
}

/// How one factor reads and scores its raw input
struct FactorEntry {
    factor: Factor,
    /// Raw value reported in the breakdown, after missing-data defaults
    value: fn(&RawSignals, &NormalizationConfig) -> Option<f64>,
    normalize: fn(&RawSignals, &NormalizationConfig) -> f64,
}

const FACTORS: [FactorEntry; 4] = [
    FactorEntry {
        factor: Factor::MarketCap,
        value: |s, _| Some(reported(s.market_cap)),
        normalize: |s, c| normalize_market_cap(reported(s.market_cap), c),
    },
    FactorEntry {
        factor: Factor::Volume24h,
        value: |s, _| Some(reported(s.volume_24h)),
        normalize: |s, c| normalize_volume(reported(s.volume_24h), c),
    },
    FactorEntry {
        factor: Factor::HolderDiversity,
        value: |s, c| Some(holder_concentration(s, c)),
        normalize: |s, c| normalize_holder_diversity(holder_concentration(s, c), c),
    },
    FactorEntry {
        factor: Factor::GithubActivity,
        value: |_, _| None,
        normalize: |s, c| normalize_github_activity(s.github.metrics(), c),
    },
];

/// Missing and non-finite amounts count as zero
fn reported(raw: Option<f64>) -> f64 {
    raw.filter(|value| value.is_finite()).unwrap_or(0.0)
}

/// Share of supply held by the top holders, within `[0, 1]`
fn holder_concentration(signals: &RawSignals, config: &NormalizationConfig) -> f64 {
    signals
        .holder_concentration
        .filter(|share| share.is_finite())
        .map(|share| share.clamp(0.0, 1.0))
        .unwrap_or(config.default_holder_concentration)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// Score `signals` with `weights`.
///
/// Factor scores are whole numbers; the composite is their weighted sum with
/// two decimals, so it always matches the breakdown.
pub fn combine(
    coin_id: &str,
    signals: &RawSignals,
    weights: &FactorWeights,
    config: &NormalizationConfig,
) -> ScoreBreakdown {
    let results = FACTORS.map(|entry| {
        let mut result = FactorResult {
            weight: weights.weight(entry.factor),
            score: (entry.normalize)(signals, config).round(),
            value: (entry.value)(signals, config),
            metrics: None,
            repository: None,
            error: None,
        };

        if entry.factor == Factor::GithubActivity {
            result.metrics = signals.github.metrics().cloned();
            result.repository = Some(signals.github.status());
            result.error = signals.github.error().map(str::to_string);
        }

        result
    });

    let score = round_to(results.iter().map(FactorResult::weighted).sum(), 2);
    let [market_cap, volume_24h, holder_diversity, github_activity] = results;

    ScoreBreakdown {
        coin_id: coin_id.to_string(),
        score,
        breakdown: Breakdown {
            market_cap,
            volume_24h,
            holder_diversity,
            github_activity,
        },
    }
}

pub struct ScoreAggregator {
    market: MarketData,
    github: GitHubMetricsResolver,
    weights: FactorWeights,
    normalization: NormalizationConfig,
    retry: RetryPolicy,
}

impl ScoreAggregator {
    pub fn new(
        market: MarketData,
        github: GitHubMetricsResolver,
        weights: FactorWeights,
        normalization: NormalizationConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            market,
            github,
            weights,
            normalization,
            retry,
        }
    }

    /// Gather the raw signals for an asset and score them
    pub async fn compute(&self, id: &AssetIdentifier) -> Result<ScoreBreakdown, EngineError> {
        let coin = with_retry("market data", &self.retry, || self.market.coin_data(id))
            .await
            .map_err(|err| EngineError::from_provider(err, id.as_str()))?;

        let github = self.github.resolve(&coin.id, &coin.github_repos).await;

        let signals = RawSignals {
            market_cap: coin.market_cap_usd,
            volume_24h: coin.volume_24h_usd,
            holder_concentration: coin.top_holder_concentration,
            github,
        };

        let result = combine(&coin.id, &signals, &self.weights, &self.normalization);

        tracing::debug!(
            "Scored {} as {} ({}), repository {:?}",
            coin.id,
            result.display_score(),
            result.rating(),
            signals.github.status()
        );

        Ok(result)
    }
}
