//! Composite asset-quality score
//!
//! Four independently weighted, independently normalized factors:
//! - Market cap (0.25): log-scaled between a floor and a ceiling
//! - 24h volume (0.15): log-scaled between a floor and a ceiling
//! - Holder diversity (0.25): decreasing in top-holder concentration
//! - GitHub activity (0.35): stars, commits, contributors and forks

pub mod aggregator;
pub mod breakdown;
pub mod normalize;
pub mod weights;

pub use aggregator::{combine, RawSignals, ScoreAggregator};
pub use breakdown::{Breakdown, FactorResult, RepositoryStatus, ScoreBreakdown};
pub use normalize::{GitHubCurve, LogScale, NormalizationConfig, NOT_TRACKED_SCORE};
pub use weights::{Factor, FactorWeights};
