use std::{fmt, str::FromStr};

use serde::Serialize;
use thiserror::Error;

/// Longest identifier accepted from callers
pub const MAX_IDENTIFIER_LEN: usize = 100;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("Asset identifier is empty")]
    Empty,

    #[error("Asset identifier is {0} characters long (max {max})", max = MAX_IDENTIFIER_LEN)]
    TooLong(usize),

    #[error("Asset identifier contains invalid character `{0}`")]
    InvalidCharacter(char),
}

/// Case-insensitive key identifying a coin or token.
///
/// Always stored trimmed and lower-cased, so two identifiers that differ only
/// in case compare equal and hit the same cache entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AssetIdentifier(String);

impl AssetIdentifier {
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(IdentifierError::Empty);
        }

        let len = trimmed.chars().count();
        if len > MAX_IDENTIFIER_LEN {
            return Err(IdentifierError::TooLong(len));
        }

        if let Some(c) = trimmed.chars().find(|c| !is_allowed(*c)) {
            return Err(IdentifierError::InvalidCharacter(c));
        }

        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ' ')
}

impl FromStr for AssetIdentifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for AssetIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AssetIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
