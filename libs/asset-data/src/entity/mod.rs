pub mod asset_id;
pub mod coin;
pub mod github;
pub mod tokenomics;

// Re-exports for convenience
pub use asset_id::{AssetIdentifier, IdentifierError, MAX_IDENTIFIER_LEN};
pub use coin::{CoinData, CoinListing};
pub use github::{GitHubMetrics, RepoRef};
pub use tokenomics::{MaxSupply, TokenomicsSnapshot};
