//! Normalization curves
//!
//! Each function maps one raw metric to a sub-score in [0, 100]. They are pure
//! and monotonic: more market cap, volume or development activity never lowers
//! the score, more holder concentration never raises it.

use asset_data::GitHubMetrics;

use crate::error::EngineError;

/// Sub-score of `github_activity` when no repository is on file
pub const NOT_TRACKED_SCORE: f64 = 0.0;

/// Log10 scale between a floor (score 0) and a ceiling (score 100)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogScale {
    pub floor: f64,
    pub ceiling: f64,
}

impl LogScale {
    pub const fn new(floor: f64, ceiling: f64) -> Self {
        Self { floor, ceiling }
    }

    pub fn score(&self, raw: f64) -> f64 {
        if raw.is_nan() || raw <= self.floor {
            return 0.0;
        }
        if raw >= self.ceiling {
            return 100.0;
        }

        let low = self.floor.log10();
        let high = self.ceiling.log10();
        (100.0 * (raw.log10() - low) / (high - low)).clamp(0.0, 100.0)
    }

    fn validate(&self, name: &str) -> Result<(), EngineError> {
        if !(self.floor > 0.0 && self.floor.is_finite()) {
            return Err(EngineError::InvalidConfig(format!(
                "{name} floor must be positive, got {}",
                self.floor
            )));
        }
        if !(self.ceiling > self.floor && self.ceiling.is_finite()) {
            return Err(EngineError::InvalidConfig(format!(
                "{name} ceiling ({}) must be above its floor ({})",
                self.ceiling, self.floor
            )));
        }
        Ok(())
    }
}

/// Weighted blend of the four repository metrics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GitHubCurve {
    pub stars_ceiling: f64,
    pub commits_ceiling: f64,
    pub contributors_ceiling: f64,
    pub forks_ceiling: f64,

    pub stars_weight: f64,
    pub commits_weight: f64,
    pub contributors_weight: f64,
    pub forks_weight: f64,
}

impl Default for GitHubCurve {
    fn default() -> Self {
        Self {
            stars_ceiling: 50_000.0,
            commits_ceiling: 5_000.0,
            contributors_ceiling: 1_000.0,
            forks_ceiling: 20_000.0,

            stars_weight: 0.30,
            commits_weight: 0.35,
            contributors_weight: 0.20,
            forks_weight: 0.15,
        }
    }
}

impl GitHubCurve {
    /// Score of a single count against its ceiling, log(1 + x) so that 0 maps to 0
    fn component(count: u64, ceiling: f64) -> f64 {
        let scaled = (1.0 + count as f64).log10() / (1.0 + ceiling).log10();
        100.0 * scaled.clamp(0.0, 1.0)
    }

    pub fn score(&self, metrics: &GitHubMetrics) -> f64 {
        let blended = self.stars_weight * Self::component(metrics.stars, self.stars_ceiling)
            + self.commits_weight * Self::component(metrics.commits_year, self.commits_ceiling)
            + self.contributors_weight
                * Self::component(metrics.contributors, self.contributors_ceiling)
            + self.forks_weight * Self::component(metrics.forks, self.forks_ceiling);

        blended.clamp(0.0, 100.0)
    }

    fn validate(&self) -> Result<(), EngineError> {
        let ceilings = [
            self.stars_ceiling,
            self.commits_ceiling,
            self.contributors_ceiling,
            self.forks_ceiling,
        ];
        if ceilings.iter().any(|c| !(*c > 0.0 && c.is_finite())) {
            return Err(EngineError::InvalidConfig(
                "GitHub ceilings must be positive".to_string(),
            ));
        }

        let weights = [
            self.stars_weight,
            self.commits_weight,
            self.contributors_weight,
            self.forks_weight,
        ];
        let total: f64 = weights.iter().sum();
        if weights.iter().any(|w| *w < 0.0) || (total - 1.0).abs() > 1e-9 {
            return Err(EngineError::InvalidConfig(format!(
                "GitHub metric weights must be non-negative and sum to 1.0, got {total}"
            )));
        }
        Ok(())
    }
}

/// Curve constants for every factor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizationConfig {
    pub market_cap: LogScale,
    pub volume: LogScale,
    /// Used when no holder data is available for an asset
    pub default_holder_concentration: f64,
    pub github: GitHubCurve,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            market_cap: LogScale::new(1e6, 1e10),
            volume: LogScale::new(1e5, 1e9),
            default_holder_concentration: 0.15,
            github: GitHubCurve::default(),
        }
    }
}

impl NormalizationConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        self.market_cap.validate("market cap")?;
        self.volume.validate("volume")?;
        self.github.validate()?;

        if !(0.0..=1.0).contains(&self.default_holder_concentration) {
            return Err(EngineError::InvalidConfig(format!(
                "default holder concentration must be within [0, 1], got {}",
                self.default_holder_concentration
            )));
        }
        Ok(())
    }
}

pub fn normalize_market_cap(raw: f64, config: &NormalizationConfig) -> f64 {
    config.market_cap.score(raw)
}

pub fn normalize_volume(raw: f64, config: &NormalizationConfig) -> f64 {
    config.volume.score(raw)
}

/// Decreasing in the share of supply held by the top holders
pub fn normalize_holder_diversity(concentration: f64, _config: &NormalizationConfig) -> f64 {
    if concentration.is_nan() {
        return 0.0;
    }
    100.0 * (1.0 - concentration.clamp(0.0, 1.0))
}

pub fn normalize_github_activity(
    metrics: Option<&GitHubMetrics>,
    config: &NormalizationConfig,
) -> f64 {
    match metrics {
        Some(metrics) => config.github.score(metrics),
        None => NOT_TRACKED_SCORE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> NormalizationConfig {
        NormalizationConfig::default()
    }

    fn repo(stars: u64, commits_year: u64, contributors: u64, forks: u64) -> GitHubMetrics {
        GitHubMetrics {
            url: "https://github.com/bitcoin/bitcoin".to_string(),
            stars,
            commits_year,
            contributors,
            forks,
            license: Some("MIT License".to_string()),
            watchers: 0,
            open_issues: 0,
            created_at: None,
            last_commit: None,
            is_fork: false,
        }
    }

    #[test]
    fn test_market_cap_saturates() {
        let config = config();
        assert_eq!(normalize_market_cap(1e10, &config), 100.0);
        assert_eq!(normalize_market_cap(5e10, &config), 100.0);
        assert_eq!(normalize_market_cap(f64::INFINITY, &config), 100.0);
        assert_eq!(normalize_market_cap(1e6, &config), 0.0);
        assert_eq!(normalize_market_cap(10.0, &config), 0.0);
    }

    #[test]
    fn test_market_cap_zero_negative_nan() {
        let config = config();
        assert_eq!(normalize_market_cap(0.0, &config), 0.0);
        assert_eq!(normalize_market_cap(-5.0, &config), 0.0);
        assert_eq!(normalize_market_cap(f64::NAN, &config), 0.0);
    }

    #[test]
    fn test_log_scale_midpoint() {
        let config = config();
        // Halfway between 1e6 and 1e10 in log space
        assert!((normalize_market_cap(1e8, &config) - 50.0).abs() < 1e-9);
        // 2e8 volume: (log10(2e8) - 5) / 4
        let expected = 100.0 * (2e8_f64.log10() - 5.0) / 4.0;
        assert!((normalize_volume(2e8, &config) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_market_cap_and_volume_are_increasing() {
        let config = config();
        let samples = [0.0, 1.0, 1e5, 3e5, 1e6, 4e6, 1e7, 1e8, 7e8, 1e9, 1e10, 1e12];

        for pair in samples.windows(2) {
            assert!(normalize_market_cap(pair[0], &config) <= normalize_market_cap(pair[1], &config));
            assert!(normalize_volume(pair[0], &config) <= normalize_volume(pair[1], &config));
        }
    }

    #[test]
    fn test_holder_diversity_is_decreasing() {
        let config = config();
        let samples = [-0.5, 0.0, 0.05, 0.1, 0.15, 0.5, 0.9, 1.0, 1.5];

        for pair in samples.windows(2) {
            assert!(
                normalize_holder_diversity(pair[0], &config)
                    >= normalize_holder_diversity(pair[1], &config)
            );
        }
        assert_eq!(normalize_holder_diversity(0.10, &config), 90.0);
        assert_eq!(normalize_holder_diversity(0.0, &config), 100.0);
        assert_eq!(normalize_holder_diversity(1.0, &config), 0.0);
        assert_eq!(normalize_holder_diversity(f64::NAN, &config), 0.0);
    }

    #[test]
    fn test_github_not_tracked_is_fixed() {
        let config = config();
        assert_eq!(normalize_github_activity(None, &config), NOT_TRACKED_SCORE);
        assert!(!normalize_github_activity(None, &config).is_nan());
    }

    #[test]
    fn test_github_zero_metrics_differs_from_ceilings() {
        let config = config();
        let empty = repo(0, 0, 0, 0);
        let huge = repo(1_000_000, 100_000, 10_000, 500_000);

        assert_eq!(normalize_github_activity(Some(&empty), &config), 0.0);
        assert!((normalize_github_activity(Some(&huge), &config) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_github_is_increasing_in_each_metric() {
        let config = config();
        let base = normalize_github_activity(Some(&repo(100, 100, 10, 10)), &config);

        assert!(normalize_github_activity(Some(&repo(1_000, 100, 10, 10)), &config) > base);
        assert!(normalize_github_activity(Some(&repo(100, 1_000, 10, 10)), &config) > base);
        assert!(normalize_github_activity(Some(&repo(100, 100, 100, 10)), &config) > base);
        assert!(normalize_github_activity(Some(&repo(100, 100, 10, 100)), &config) > base);
    }

    #[test]
    fn test_validate() {
        assert!(config().validate().is_ok());

        let mut bad = config();
        bad.market_cap = LogScale::new(1e10, 1e6);
        assert!(matches!(bad.validate(), Err(EngineError::InvalidConfig(_))));

        let mut bad = config();
        bad.volume.floor = 0.0;
        assert!(bad.validate().is_err());

        let mut bad = config();
        bad.default_holder_concentration = 1.5;
        assert!(bad.validate().is_err());

        let mut bad = config();
        bad.github.forks_weight = 0.5;
        assert!(bad.validate().is_err());
    }
}
