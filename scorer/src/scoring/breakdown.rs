//! Score result types, serialized as the score endpoint's response

use asset_data::GitHubMetrics;
use serde::{Deserialize, Serialize};

use super::weights::Factor;

/// Outcome of the repository lookup behind `github_activity`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryStatus {
    Tracked,
    NotTracked,
    Unavailable,
}

/// One weighted factor of the composite score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorResult {
    pub weight: f64,
    /// Whole number in [0, 100]
    pub score: f64,
    /// Raw metric the score was derived from (omitted for `github_activity`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Present only when a repository is tracked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<GitHubMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<RepositoryStatus>,
    /// Why the repository lookup was unavailable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FactorResult {
    pub fn weighted(&self) -> f64 {
        self.weight * self.score
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub market_cap: FactorResult,
    pub volume_24h: FactorResult,
    pub holder_diversity: FactorResult,
    pub github_activity: FactorResult,
}

impl Breakdown {
    pub fn factor(&self, factor: Factor) -> &FactorResult {
        match factor {
            Factor::MarketCap => &self.market_cap,
            Factor::Volume24h => &self.volume_24h,
            Factor::HolderDiversity => &self.holder_diversity,
            Factor::GithubActivity => &self.github_activity,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Factor, &FactorResult)> + '_ {
        Factor::ALL.into_iter().map(move |f| (f, self.factor(f)))
    }
}

/// Composite score with its per-factor breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Canonical asset id the score was computed for
    pub coin_id: String,
    /// Weighted sum of the factor scores, two decimals
    pub score: f64,
    pub breakdown: Breakdown,
}

impl ScoreBreakdown {
    /// Σ weight × score recomputed from the breakdown
    pub fn weighted_sum(&self) -> f64 {
        self.breakdown.iter().map(|(_, f)| f.weighted()).sum()
    }

    pub fn total_weight(&self) -> f64 {
        self.breakdown.iter().map(|(_, f)| f.weight).sum()
    }

    /// Score rounded to one decimal for display
    pub fn display_score(&self) -> f64 {
        (self.score * 10.0).round() / 10.0
    }

    /// Human-readable rating band
    pub fn rating(&self) -> &'static str {
        match self.score {
            s if s >= 80.0 => "Excellent",
            s if s >= 60.0 => "Good",
            s if s >= 40.0 => "Fair",
            s if s >= 20.0 => "Poor",
            _ => "Risky",
        }
    }

    pub fn repository_status(&self) -> Option<RepositoryStatus> {
        self.breakdown.github_activity.repository
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factor(weight: f64, score: f64) -> FactorResult {
        FactorResult {
            weight,
            score,
            value: Some(0.0),
            metrics: None,
            repository: None,
            error: None,
        }
    }

    fn breakdown(score: f64) -> ScoreBreakdown {
        ScoreBreakdown {
            coin_id: "bitcoin".to_string(),
            score,
            breakdown: Breakdown {
                market_cap: factor(0.25, 100.0),
                volume_24h: factor(0.15, 83.0),
                holder_diversity: factor(0.25, 90.0),
                github_activity: FactorResult {
                    value: None,
                    repository: Some(RepositoryStatus::NotTracked),
                    ..factor(0.35, 0.0)
                },
            },
        }
    }

    #[test]
    fn test_display_score() {
        assert_eq!(breakdown(59.95).display_score(), 60.0);
        assert_eq!(breakdown(59.94).display_score(), 59.9);
    }

    #[test]
    fn test_rating() {
        assert_eq!(breakdown(85.0).rating(), "Excellent");
        assert_eq!(breakdown(65.0).rating(), "Good");
        assert_eq!(breakdown(45.0).rating(), "Fair");
        assert_eq!(breakdown(25.0).rating(), "Poor");
        assert_eq!(breakdown(10.0).rating(), "Risky");
    }

    #[test]
    fn test_weighted_sum() {
        let result = breakdown(59.95);
        assert!((result.weighted_sum() - 59.95).abs() < 1e-9);
        assert_eq!(result.total_weight(), 1.0);
    }

    #[test]
    fn test_not_tracked_serializes_without_metrics() {
        let json = serde_json::to_value(breakdown(59.95)).unwrap();
        let github = &json["breakdown"]["github_activity"];

        assert!(github.get("metrics").is_none());
        assert!(github.get("value").is_none());
        assert_eq!(github["repository"], "not_tracked");
        assert_eq!(github["weight"], 0.35);
        assert_eq!(json["breakdown"]["market_cap"]["score"], 100.0);
    }
}
