//! GitHub REST client used to fetch repository metadata, trees and file contents.
//!
//! Every request, body included, goes through [`with_retry`]. Rate-limit responses (429, or
//! 403 with the quota exhausted), 5xx responses, timeouts and connection failures are retried;
//! a rate-limit response carrying a reset time waits for that moment instead of backing off
//! blindly. Any other 403 is a permission problem and fails at once.

use crate::config::Config;
use crate::error::{ProcessorError, Result};
use crate::processors::TreeItem;
use crate::utils::{with_retry, RetryPolicy};
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use chrono::Utc;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

const USER_AGENT_VALUE: &str = "explainthisrepo";
const JSON_ACCEPT: &str = "application/vnd.github.v3+json";
const RAW_ACCEPT: &str = "application/vnd.github.v3.raw";

/// Language name to byte count, largest first
pub type LanguageStats = Vec<(String, u64)>;

/// Repository metadata used in prompts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoMetadata {
    /// `owner/name`
    pub full_name: String,
    /// Short description set on GitHub
    pub description: Option<String>,
    /// Branch the tree is read from
    #[serde(default = "default_branch")]
    pub default_branch: String,
}

fn default_branch() -> String {
    "main".to_string()
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Vec<TreeItem>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

/// Thin client over the GitHub REST API
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    base_url: Url,
    retry: RetryPolicy,
    timeout_secs: u64,
}

impl GitHubClient {
    /// Builds a client with the configured base URL, token, timeout and retry policy
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_ACCEPT));
        if let Some(token) = config.github_token() {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ProcessorError::Config("GITHUB_TOKEN contains invalid characters".into()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| ProcessorError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: Url::parse(&config.github_api_base)?,
            retry: config.retry.clone(),
            timeout_secs: config.request_timeout_secs,
        })
    }

    /// Fetches `full_name`, `description` and the default branch
    pub async fn fetch_repo(&self, owner: &str, repo: &str) -> Result<RepoMetadata> {
        let url = self.endpoint(&["repos", owner, repo])?;
        let what = format!("repository {}/{}", owner, repo);
        let body = self.get(&url, JSON_ACCEPT, &what).await?;
        serde_json::from_str::<RepoMetadata>(&body)
            .map_err(|e| ProcessorError::Parse(format!("unexpected metadata for {}: {}", what, e)))
    }

    /// Fetches the raw README; a missing README is `Ok(None)`
    pub async fn fetch_readme(&self, owner: &str, repo: &str) -> Result<Option<String>> {
        let url = self.endpoint(&["repos", owner, repo, "readme"])?;
        let what = format!("README of {}/{}", owner, repo);
        match self.get(&url, RAW_ACCEPT, &what).await {
            Ok(body) => Ok(Some(body)),
            Err(ProcessorError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Fetches the language histogram, sorted by bytes descending then name
    pub async fn fetch_languages(&self, owner: &str, repo: &str) -> Result<LanguageStats> {
        let url = self.endpoint(&["repos", owner, repo, "languages"])?;
        let what = format!("languages of {}/{}", owner, repo);
        let body = self.get(&url, JSON_ACCEPT, &what).await?;
        let languages: HashMap<String, u64> = serde_json::from_str(&body).map_err(|e| ProcessorError::Parse(format!("unexpected {}: {}", what, e)))?;

        let mut stats: LanguageStats = languages.into_iter().collect();
        stats.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(stats)
    }

    /// Resolves the default branch and returns its full recursive tree listing
    pub async fn fetch_tree(&self, owner: &str, repo: &str) -> Result<Vec<TreeItem>> {
        let metadata = self.fetch_repo(owner, repo).await?;
        self.fetch_tree_at(owner, repo, &metadata.default_branch).await
    }

    /// Recursive tree listing of a branch that is already known
    pub async fn fetch_tree_at(&self, owner: &str, repo: &str, branch: &str) -> Result<Vec<TreeItem>> {
        let mut url = self.endpoint(&["repos", owner, repo, "git", "trees", branch])?;
        url.query_pairs_mut().append_pair("recursive", "1");

        let what = format!("tree of {}/{}@{}", owner, repo, branch);
        let body = self.get(&url, JSON_ACCEPT, &what).await?;
        let listing: TreeResponse = serde_json::from_str(&body)
            .map_err(|e| ProcessorError::Parse(format!("unexpected {}: {}", what, e)))?;

        if listing.truncated {
            warn!("GitHub truncated the {}; the listing is incomplete", what);
        }
        debug!("{} has {} entries", what, listing.tree.len());
        Ok(listing.tree)
    }

    /// Fetches the raw content of one file, untruncated
    pub async fn fetch_file(&self, owner: &str, repo: &str, path: &str) -> Result<String> {
        let mut segments = vec!["repos", owner, repo, "contents"];
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        let url = self.endpoint(&segments)?;
        let what = format!("{} in {}/{}", path, owner, repo);
        self.get(&url, RAW_ACCEPT, &what).await
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProcessorError::Config(format!("Invalid GitHub API base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GETs `url` and returns the body text; the body read is part of each attempt
    async fn get(&self, url: &Url, accept: &str, what: &str) -> Result<String> {
        with_retry(
            &self.retry,
            move || self.send_once(url, accept, what),
            ProcessorError::is_transient,
            rate_limit_wait,
        )
        .await
    }

    async fn send_once(&self, url: &Url, accept: &str, what: &str) -> Result<String> {
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, accept)
            .send()
            .await
            .map_err(|e| ProcessorError::from_transport(&e, self.timeout_secs))?;
        classify(response, what)
            .await?
            .text()
            .await
            .map_err(|e| ProcessorError::from_transport(&e, self.timeout_secs))
    }
}

/// Maps a non-success response onto the error taxonomy
async fn classify(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::NOT_FOUND => Err(ProcessorError::NotFound(what.to_string())),
        StatusCode::TOO_MANY_REQUESTS => Err(rate_limited(&response, what)),
        StatusCode::FORBIDDEN if quota_exhausted(&response) => Err(rate_limited(&response, what)),
        s if s.is_server_error() => Err(ProcessorError::Network(format!(
            "GitHub returned HTTP {} while fetching {}",
            s.as_u16(),
            what
        ))),
        s => {
            let message = match response.json::<ApiMessage>().await {
                Ok(body) => body.message,
                Err(_) => s.canonical_reason().unwrap_or("request rejected").to_string(),
            };
            Err(ProcessorError::GitHubApi { status: s.as_u16(), message })
        }
    }
}

/// GitHub sends `x-ratelimit-*` on every response; only an empty quota or `retry-after`
/// marks a 403 as a rate limit
fn quota_exhausted(response: &Response) -> bool {
    header_u64(response, "x-ratelimit-remaining") == Some(0) || response.headers().contains_key("retry-after")
}

fn rate_limited(response: &Response, what: &str) -> ProcessorError {
    let reset_at = header_u64(response, "retry-after")
        .map(|secs| now_epoch() + secs)
        .or_else(|| header_u64(response, "x-ratelimit-reset"));
    ProcessorError::RateLimitExceeded {
        message: format!("HTTP {} while fetching {}", response.status().as_u16(), what),
        reset_at,
    }
}

fn header_u64(response: &Response, name: &str) -> Option<u64> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

fn now_epoch() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

/// Time left until `reset_at`; zero when it already passed
pub fn wait_until(reset_at: u64, now: u64) -> Duration {
    Duration::from_secs(reset_at.saturating_sub(now))
}

/// Wait override for [`with_retry`]: honour the rate-limit reset when the server sent one
fn rate_limit_wait(err: &ProcessorError) -> Option<Duration> {
    match err {
        ProcessorError::RateLimitExceeded { reset_at: Some(reset_at), .. } => {
            Some(wait_until(*reset_at, now_epoch()))
        }
        _ => None,
    }
}
