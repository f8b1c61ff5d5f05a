use serde::{Deserialize, Serialize};

use super::coin::CoinData;

/// Hard limit on an asset's supply.
///
/// On the wire a capped supply is a number and an uncapped one is `null` (or
/// an absent field). `Capped(0.0)` stays distinct from `Uncapped`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum MaxSupply {
    Capped(f64),
    #[default]
    Uncapped,
}

impl MaxSupply {
    pub fn is_capped(&self) -> bool {
        matches!(self, MaxSupply::Capped(_))
    }

    pub fn amount(&self) -> Option<f64> {
        match self {
            MaxSupply::Capped(amount) => Some(*amount),
            MaxSupply::Uncapped => None,
        }
    }
}

impl From<Option<f64>> for MaxSupply {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(amount) => MaxSupply::Capped(amount),
            None => MaxSupply::Uncapped,
        }
    }
}

impl From<MaxSupply> for Option<f64> {
    fn from(value: MaxSupply) -> Self {
        value.amount()
    }
}

/// Supply and capitalization figures for one asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenomicsSnapshot {
    pub name: String,
    pub symbol: String,
    pub market_cap: f64,
    pub circulating_supply: Option<f64>,
    pub total_supply: Option<f64>,
    #[serde(default)]
    pub max_supply: MaxSupply,
}

impl From<&CoinData> for TokenomicsSnapshot {
    fn from(coin: &CoinData) -> Self {
        Self {
            name: coin.name.clone(),
            symbol: coin.symbol.clone(),
            market_cap: coin.market_cap_usd.unwrap_or(0.0),
            circulating_supply: coin.circulating_supply,
            total_supply: coin.total_supply,
            max_supply: coin.max_supply,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_max_supply_is_uncapped() {
        let json = r#"{
            "name": "Ethereum",
            "symbol": "eth",
            "market_cap": 400000000000.0,
            "circulating_supply": 120000000.0,
            "total_supply": 120000000.0
        }"#;

        let snapshot: TokenomicsSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.max_supply, MaxSupply::Uncapped);
        assert!(!snapshot.max_supply.is_capped());
    }

    #[test]
    fn test_null_and_zero_max_supply_are_distinct() {
        let null: TokenomicsSnapshot = serde_json::from_str(
            r#"{"name":"A","symbol":"a","market_cap":1.0,"circulating_supply":null,"total_supply":null,"max_supply":null}"#,
        )
        .unwrap();
        let zero: TokenomicsSnapshot = serde_json::from_str(
            r#"{"name":"A","symbol":"a","market_cap":1.0,"circulating_supply":null,"total_supply":null,"max_supply":0.0}"#,
        )
        .unwrap();

        assert_eq!(null.max_supply, MaxSupply::Uncapped);
        assert_eq!(zero.max_supply, MaxSupply::Capped(0.0));
        assert_ne!(null.max_supply, zero.max_supply);
    }

    #[test]
    fn test_uncapped_serializes_as_null() {
        let snapshot = TokenomicsSnapshot {
            name: "Ethereum".to_string(),
            symbol: "eth".to_string(),
            market_cap: 1.0,
            circulating_supply: Some(1.0),
            total_supply: None,
            max_supply: MaxSupply::Uncapped,
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        assert!(value["max_supply"].is_null());

        let capped = TokenomicsSnapshot {
            max_supply: MaxSupply::Capped(21_000_000.0),
            ..snapshot
        };
        let value = serde_json::to_value(&capped).unwrap();
        assert_eq!(value["max_supply"], 21_000_000.0);

        let back: TokenomicsSnapshot = serde_json::from_value(value).unwrap();
        assert_eq!(back, capped);
    }
}
