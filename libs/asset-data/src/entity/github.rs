use serde::{Deserialize, Serialize};

/// Development activity for a source repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubMetrics {
    pub url: String,
    pub stars: u64,
    pub commits_year: u64,
    pub contributors: u64,
    pub forks: u64,
    pub license: Option<String>,

    // Extra repository facts
    #[serde(default)]
    pub watchers: u64,
    #[serde(default)]
    pub open_issues: u64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub last_commit: Option<String>,
    #[serde(default)]
    pub is_fork: bool,
}

/// `owner/name` pair identifying a GitHub repository
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse `https://github.com/<owner>/<repo>[/...]`
    pub fn from_url(url: &str) -> Option<Self> {
        let trimmed = url
            .trim()
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');

        let mut parts = trimmed.split('/');
        let host = parts.next()?;
        if host != "github.com" && host != "www.github.com" {
            return None;
        }

        let owner = parts.next().filter(|s| !s.is_empty())?;
        let name = parts
            .next()
            .map(|s| s.trim_end_matches(".git"))
            .filter(|s| !s.is_empty())?;

        Some(Self::new(owner, name))
    }

    pub fn html_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.name)
    }
}
