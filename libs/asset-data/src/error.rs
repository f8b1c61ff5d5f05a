use thiserror::Error;

/// Failure talking to an upstream data source
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("`{0}` not found")]
    NotFound(String),

    #[error("Rate limited by {0} (429), will retry")]
    RateLimited(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Redis error: {0}")]
    Redis(String),
}

impl ProviderError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited(_)
                | ProviderError::Timeout(_)
                | ProviderError::Http(_)
                | ProviderError::Redis(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound(_))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        let target = err
            .url()
            .map(|url| url.to_string())
            .unwrap_or_else(|| "request".to_string());

        if err.is_timeout() {
            ProviderError::Timeout(target)
        } else if err.is_decode() {
            ProviderError::Decode(err.to_string())
        } else {
            ProviderError::Http(err.to_string())
        }
    }
}

impl From<redis::RedisError> for ProviderError {
    fn from(err: redis::RedisError) -> Self {
        ProviderError::Redis(err.to_string())
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Decode(err.to_string())
    }
}
