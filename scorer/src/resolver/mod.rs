pub mod github;
pub mod tokenomics;

pub use github::{GitHubLookup, GitHubMetricsResolver, REPO_MAPPING};
pub use tokenomics::TokenomicsResolver;
