pub mod config;
pub mod engine;
pub mod error;
pub mod resolver;
pub mod retry;
pub mod scoring;
pub mod service;
pub mod updater;

// Re-export commonly used types
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::EngineError;
pub use resolver::{GitHubLookup, GitHubMetricsResolver, TokenomicsResolver};
pub use retry::RetryPolicy;
pub use scoring::{FactorResult, RepositoryStatus, ScoreAggregator, ScoreBreakdown};
pub use service::{ScoreService, TokenomicsService};
pub use updater::{AliasUpdate, BatchUpdate, CacheUpdater, CoinUpdate, POPULAR_COINS};
