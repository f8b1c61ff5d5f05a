use std::fmt;

use crate::error::EngineError;

/// One of the four scored signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Factor {
    MarketCap,
    Volume24h,
    HolderDiversity,
    GithubActivity,
}

impl Factor {
    pub const ALL: [Factor; 4] = [
        Factor::MarketCap,
        Factor::Volume24h,
        Factor::HolderDiversity,
        Factor::GithubActivity,
    ];

    /// Field name in the score breakdown
    pub fn key(&self) -> &'static str {
        match self {
            Factor::MarketCap => "market_cap",
            Factor::Volume24h => "volume_24h",
            Factor::HolderDiversity => "holder_diversity",
            Factor::GithubActivity => "github_activity",
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Weight of each factor in the composite score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorWeights {
    pub market_cap: f64,
    pub volume_24h: f64,
    pub holder_diversity: f64,
    pub github_activity: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            market_cap: 0.25,
            volume_24h: 0.15,
            holder_diversity: 0.25,
            github_activity: 0.35,
        }
    }
}

impl FactorWeights {
    pub fn weight(&self, factor: Factor) -> f64 {
        match factor {
            Factor::MarketCap => self.market_cap,
            Factor::Volume24h => self.volume_24h,
            Factor::HolderDiversity => self.holder_diversity,
            Factor::GithubActivity => self.github_activity,
        }
    }

    pub fn total(&self) -> f64 {
        Factor::ALL.iter().map(|f| self.weight(*f)).sum()
    }

    /// Every weight in (0, 1) and the weights sum to 1.0
    pub fn validate(&self) -> Result<(), EngineError> {
        for factor in Factor::ALL {
            let weight = self.weight(factor);
            if !(weight > 0.0 && weight < 1.0) {
                return Err(EngineError::InvalidConfig(format!(
                    "weight of {factor} must be within (0, 1), got {weight}"
                )));
            }
        }

        let total = self.total();
        if (total - 1.0).abs() > 1e-9 {
            return Err(EngineError::InvalidConfig(format!(
                "factor weights must sum to 1.0, got {total}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let weights = FactorWeights::default();
        assert!(weights.validate().is_ok());
        assert_eq!(weights.total(), 1.0);
        assert_eq!(weights.weight(Factor::GithubActivity), 0.35);
    }

    #[test]
    fn test_rejects_bad_weights() {
        let weights = FactorWeights {
            market_cap: 0.5,
            ..FactorWeights::default()
        };
        assert!(weights.validate().is_err());

        let weights = FactorWeights {
            market_cap: 0.0,
            volume_24h: 0.40,
            ..FactorWeights::default()
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn test_factor_keys() {
        let keys: Vec<&str> = Factor::ALL.iter().map(Factor::key).collect();
        assert_eq!(
            keys,
            vec!["market_cap", "volume_24h", "holder_diversity", "github_activity"]
        );
    }
}
