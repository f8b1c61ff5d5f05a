use asset_data::{IdentifierError, ProviderError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid asset identifier: {0}")]
    InvalidIdentifier(#[from] IdentifierError),

    #[error("Asset `{0}` not found")]
    NotFound(String),

    #[error("Rate limited by {0} (429)")]
    RateLimited(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    /// Classify a provider failure for `subject` (an asset identifier)
    pub fn from_provider(err: ProviderError, subject: &str) -> Self {
        match err {
            ProviderError::NotFound(_) => EngineError::NotFound(subject.to_string()),
            ProviderError::RateLimited(source) => EngineError::RateLimited(source),
            other => EngineError::Upstream(other.to_string()),
        }
    }

    /// Whether the caller may retry later
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::RateLimited(_) | EngineError::Upstream(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_provider() {
        assert_eq!(
            EngineError::from_provider(ProviderError::NotFound("x".into()), "not-a-real-coin"),
            EngineError::NotFound("not-a-real-coin".into())
        );
        assert!(
            EngineError::from_provider(ProviderError::Timeout("coins".into()), "bitcoin")
                .is_transient()
        );
        assert!(matches!(
            EngineError::from_provider(ProviderError::RateLimited("CoinGecko".into()), "bitcoin"),
            EngineError::RateLimited(_)
        ));
    }

    #[test]
    fn test_invalid_identifier_is_terminal() {
        let err = EngineError::from(IdentifierError::Empty);
        assert!(!err.is_transient());
    }
}
