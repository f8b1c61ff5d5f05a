use serde::{Deserialize, Serialize};

use super::tokenomics::MaxSupply;

/// Market data for one asset as reported by a market data provider
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CoinData {
    /// Canonical provider id (e.g. `bitcoin`)
    pub id: String,
    pub name: String,
    pub symbol: String,

    // Market metrics
    pub market_cap_usd: Option<f64>,
    pub volume_24h_usd: Option<f64>,

    // Supply
    pub circulating_supply: Option<f64>,
    pub total_supply: Option<f64>,
    pub max_supply: MaxSupply,

    /// Source repositories advertised for the project, main one first
    pub github_repos: Vec<String>,

    /// Fraction of supply held by the top holders, when the source reports it
    pub top_holder_concentration: Option<f64>,
}

/// Entry from a provider's full coin listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinListing {
    pub id: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
}
