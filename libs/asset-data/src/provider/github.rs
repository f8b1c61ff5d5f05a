//! GitHub REST API client

use std::{env, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{
    header::{ACCEPT, AUTHORIZATION, LINK},
    Client, Response, StatusCode, Url,
};
use serde::Deserialize;

use crate::{
    entity::{GitHubMetrics, RepoRef},
    error::ProviderError,
};

use super::RepositoryHost;

mod defaults {
    pub const GITHUB_API_BASE: &str = "https://api.github.com";
    pub const HTTP_TIMEOUT_MS: &str = "5000";
    /// Window used for `commits_year`
    pub const COMMIT_WINDOW_DAYS: i64 = 365;
}

/// `/repos/{owner}/{repo}` response, only the fields we use
#[derive(Debug, Deserialize)]
struct RepoResponse {
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    #[serde(default)]
    watchers_count: u64,
    #[serde(default)]
    open_issues_count: u64,
    created_at: Option<String>,
    pushed_at: Option<String>,
    license: Option<LicenseResponse>,
    #[serde(default)]
    fork: bool,
}

#[derive(Debug, Deserialize)]
struct LicenseResponse {
    name: Option<String>,
}

/// GitHub API client implementing `RepositoryHost`
pub struct GitHubClient {
    client: Client,
    api_base: Url,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(
        api_base: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let api_base = Url::parse(api_base)
            .map_err(|e| ProviderError::Http(format!("invalid GitHub URL `{api_base}`: {e}")))?;

        // GitHub rejects requests without a User-Agent
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("asset-data/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_base,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// Build from `GITHUB_API_BASE`, `GITHUB_TOKEN` and `HTTP_TIMEOUT_MS`
    pub fn from_env() -> Result<Self, ProviderError> {
        let api_base =
            env::var("GITHUB_API_BASE").unwrap_or_else(|_| defaults::GITHUB_API_BASE.to_string());

        let timeout_ms = env::var("HTTP_TIMEOUT_MS")
            .unwrap_or_else(|_| defaults::HTTP_TIMEOUT_MS.to_string())
            .parse::<u64>()
            .unwrap_or(5000);

        if env::var("GITHUB_TOKEN").is_err() {
            tracing::info!("GITHUB_TOKEN not set, GitHub requests are unauthenticated");
        }

        Self::new(
            &api_base,
            env::var("GITHUB_TOKEN").ok(),
            Duration::from_millis(timeout_ms),
        )
    }

    fn repo_url(&self, repo: &RepoRef, tail: &[&str]) -> Result<Url, ProviderError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::Http(format!("`{}` cannot be a base URL", self.api_base)))?
            .pop_if_empty()
            .extend(["repos", repo.owner.as_str(), repo.name.as_str()])
            .extend(tail);
        Ok(url)
    }

    async fn get(&self, url: Url, query: &[(&str, &str)]) -> Result<Response, ProviderError> {
        let mut request = self
            .client
            .get(url)
            .query(query)
            .header(ACCEPT, "application/vnd.github+json");

        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        Ok(request.send().await?)
    }

    async fn fetch_repo(&self, repo: &RepoRef) -> Result<Option<RepoResponse>, ProviderError> {
        let response = self.get(self.repo_url(repo, &[])?, &[]).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        check_status(&response, repo)?;

        Ok(Some(response.json().await?))
    }

    /// Count items of a paginated listing using `per_page=1` and the `last` link
    async fn count_items(
        &self,
        url: Url,
        query: &[(&str, &str)],
        repo: &RepoRef,
    ) -> Result<u64, ProviderError> {
        let mut params: Vec<(&str, &str)> = vec![("per_page", "1")];
        params.extend_from_slice(query);

        let response = self.get(url, &params).await?;

        match response.status() {
            // Empty repository
            StatusCode::NO_CONTENT | StatusCode::CONFLICT => return Ok(0),
            _ => check_status(&response, repo)?,
        }

        let last_page = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_last_page);

        match last_page {
            Some(count) => Ok(count),
            None => {
                let items: Vec<serde_json::Value> = response.json().await?;
                Ok(items.len() as u64)
            }
        }
    }

    async fn commits_last_year(&self, repo: &RepoRef) -> Result<u64, ProviderError> {
        let since = (Utc::now() - chrono::Duration::days(defaults::COMMIT_WINDOW_DAYS)).to_rfc3339();
        let url = self.repo_url(repo, &["commits"])?;
        self.count_items(url, &[("since", since.as_str())], repo).await
    }

    async fn contributors(&self, repo: &RepoRef) -> Result<u64, ProviderError> {
        let url = self.repo_url(repo, &["contributors"])?;
        self.count_items(url, &[("anon", "false")], repo).await
    }
}

fn check_status(response: &Response, repo: &RepoRef) -> Result<(), ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    // GitHub signals an exhausted quota with 403 and x-ratelimit-remaining: 0
    let quota_exhausted = status == StatusCode::FORBIDDEN
        && response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            == Some("0");

    if status == StatusCode::TOO_MANY_REQUESTS || quota_exhausted {
        tracing::warn!("[RATE LIMIT] GitHub rate limit hit for {}/{}", repo.owner, repo.name);
        return Err(ProviderError::RateLimited("GitHub".to_string()));
    }

    Err(ProviderError::Http(format!(
        "GitHub API error {status} for {}/{}",
        repo.owner, repo.name
    )))
}

/// Page number of the `rel="last"` entry in a `Link` header
fn parse_last_page(link_header: &str) -> Option<u64> {
    link_header
        .split(',')
        .find(|part| part.contains(r#"rel="last""#))
        .and_then(|part| {
            let start = part.find('<')? + 1;
            let end = part.find('>')?;
            Url::parse(part.get(start..end)?).ok()
        })
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "page")
                .and_then(|(_, value)| value.parse().ok())
        })
}

#[async_trait]
impl RepositoryHost for GitHubClient {
    async fn repository_metrics(
        &self,
        repo: &RepoRef,
    ) -> Result<Option<GitHubMetrics>, ProviderError> {
        let Some(repo_data) = self.fetch_repo(repo).await? else {
            return Ok(None);
        };

        let (commits_year, contributors) =
            tokio::try_join!(self.commits_last_year(repo), self.contributors(repo))?;

        Ok(Some(GitHubMetrics {
            url: repo.html_url(),
            stars: repo_data.stargazers_count,
            commits_year,
            contributors,
            forks: repo_data.forks_count,
            license: repo_data.license.and_then(|license| license.name),
            watchers: repo_data.watchers_count,
            open_issues: repo_data.open_issues_count,
            created_at: repo_data.created_at,
            last_commit: repo_data.pushed_at,
            is_fork: repo_data.fork,
        }))
    }
}
