use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::rate::RateTelemetry;
use crate::retry::{is_retryable_status, with_retry, RetryConfig};

const GITHUB_API_BASE: &str = "https://api.github.com";

/// The search endpoint refuses anything above this
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Error, Debug)]
pub enum GitHubError {
    #[error("GitHub API returned {status}: {message}")]
    Http {
        status: u16,
        message: String,
        rate: RateTelemetry,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl GitHubError {
    /// HTTP status behind this error, if the upstream answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            GitHubError::Http { status, .. } => Some(*status),
            GitHubError::NotFound(_) => Some(404),
            GitHubError::NetworkError(e) => e.status().map(|s| s.as_u16()),
            GitHubError::ParseError(_) => None,
        }
    }

    /// Upstream message without our own prefix
    pub fn message(&self) -> String {
        match self {
            GitHubError::Http { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn rate(&self) -> RateTelemetry {
        match self {
            GitHubError::Http { rate, .. } => *rate,
            _ => RateTelemetry::default(),
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            GitHubError::Http { status, .. } => reqwest::StatusCode::from_u16(*status)
                .map(is_retryable_status)
                .unwrap_or(false),
            GitHubError::NetworkError(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, GitHubError>;

/// Parameters for one repository search call
#[derive(Debug, Clone, Copy)]
pub struct SearchParams<'a> {
    pub query: &'a str,
    pub sort: &'a str,
    pub order: &'a str,
    pub page: u32,
    pub per_page: u32,
}

/// One page of search results plus the telemetry that came with it
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub total_count: u64,
    pub items: Vec<GitHubRepo>,
    pub rate: RateTelemetry,
}

pub struct GitHubClient {
    client: reqwest::Client,
    token: Option<String>,
    base_url: String,
    retry_config: RetryConfig,
}

impl GitHubClient {
    pub fn new(token: Option<String>) -> Result<Self> {
        Self::with_base_url(token, GITHUB_API_BASE.to_string())
    }

    /// For GitHub Enterprise or a local stand-in
    pub fn with_base_url(token: Option<String>, base_url: String) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("AwesomeHub/0.1.0"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            token: token.filter(|t| !t.trim().is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
            retry_config: RetryConfig::default(),
        })
    }

    /// Create client with custom retry configuration
    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry_config
    }

    /// Whether requests go out with a bearer credential
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Search repositories by query expression
    pub async fn search_repositories(&self, params: SearchParams<'_>) -> Result<SearchPage> {
        let url = format!("{}/search/repositories", self.base_url);
        let per_page = params.per_page.clamp(1, MAX_PER_PAGE).to_string();
        let page = params.page.max(1).to_string();

        with_retry(&self.retry_config, GitHubError::is_retryable, || async {
            debug!("GET {} q={:?} page={}", url, params.query, page);
            let response = self
                .get(&url)
                .query(&[
                    ("q", params.query),
                    ("sort", params.sort),
                    ("order", params.order),
                    ("per_page", per_page.as_str()),
                    ("page", page.as_str()),
                ])
                .send()
                .await?;

            let rate = RateTelemetry::from_headers(response.headers());
            let response = error_for_status(response, rate).await?;

            let body: SearchResponse = response.json().await?;
            Ok(SearchPage {
                total_count: body.total_count,
                items: body.items,
                rate,
            })
        })
        .await
    }

    /// Get detailed info about a specific repository
    pub async fn get_repository(&self, owner: &str, name: &str) -> Result<GitHubRepo> {
        let url = self.repo_url(owner, name, "");
        let full_name = format!("{}/{}", owner, name);

        with_retry(&self.retry_config, GitHubError::is_retryable, || async {
            let response = self.get(&url).send().await?;
            let response = expect_found(response, &full_name).await?;
            Ok(response.json::<GitHubRepo>().await?)
        })
        .await
    }

    /// List contributors, most active first
    pub async fn list_contributors(
        &self,
        owner: &str,
        name: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<GitHubContributor>> {
        let url = self.repo_url(owner, name, "/contributors");
        let full_name = format!("{}/{}", owner, name);
        let page = page.max(1).to_string();
        let per_page = per_page.clamp(1, MAX_PER_PAGE).to_string();

        with_retry(&self.retry_config, GitHubError::is_retryable, || async {
            let response = self
                .get(&url)
                .query(&[("page", page.as_str()), ("per_page", per_page.as_str())])
                .send()
                .await?;
            let response = expect_found(response, &full_name).await?;

            // Empty repositories answer 204 with no body
            if response.status() == reqwest::StatusCode::NO_CONTENT {
                return Ok(Vec::new());
            }
            Ok(response.json::<Vec<GitHubContributor>>().await?)
        })
        .await
    }

    /// Fetch and decode the README; `None` when it isn't base64 encoded
    pub async fn get_readme(&self, owner: &str, name: &str) -> Result<Option<String>> {
        let url = self.repo_url(owner, name, "/readme");
        let full_name = format!("{}/{}", owner, name);

        let readme = with_retry(&self.retry_config, GitHubError::is_retryable, || async {
            let response = self.get(&url).send().await?;
            let response = expect_found(response, &full_name).await?;
            Ok(response.json::<GitHubReadme>().await?)
        })
        .await?;

        Ok(readme.decode())
    }

    fn repo_url(&self, owner: &str, name: &str, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}{}",
            self.base_url,
            urlencoding::encode(owner),
            urlencoding::encode(name),
            suffix
        )
    }
}

async fn expect_found(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Err(GitHubError::NotFound(what.to_string()));
    }
    let rate = RateTelemetry::from_headers(response.headers());
    error_for_status(response, rate).await
}

async fn error_for_status(
    response: reqwest::Response,
    rate: RateTelemetry,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(GitHubError::Http {
        status: status.as_u16(),
        message: upstream_message(&body),
        rate,
    })
}

/// GitHub error bodies look like `{"message": "...", "documentation_url": "..."}`
fn upstream_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[derive(Debug, Clone, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    total_count: u64,
    #[serde(default)]
    items: Vec<GitHubRepo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubRepo {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub stargazers_count: u32,
    #[serde(default)]
    pub forks_count: u32,
    pub language: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner: GitHubOwner,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubOwner {
    pub login: String,
    pub avatar_url: String,
    pub html_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubContributor {
    pub login: String,
    pub avatar_url: String,
    pub html_url: String,
    pub contributions: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubReadme {
    pub content: String,
    pub encoding: String,
}

impl GitHubReadme {
    pub fn decode(&self) -> Option<String> {
        if self.encoding != "base64" {
            return None;
        }
        // GitHub wraps the payload at 60 columns
        let compact: String = self.content.split_whitespace().collect();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(compact)
            .ok()?;
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }
}
