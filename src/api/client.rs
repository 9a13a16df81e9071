//! GitHub REST client
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building the HTTP client with the configured user agent
//! - Bearer authentication
//! - Rate-limit waits (HTTP 403/429 with reset headers)
//! - Retry with backoff for transient failures
//! - Pacing requests so only one is sent per configured interval

use crate::api::pacer::Pacer;
use crate::api::retry::{with_backoff, RetryPolicy};
use crate::api::types::{
    CommitDetail, CommitSummary, RepoPayload, SearchPayload, SourceUnit,
};
use crate::config::{ApiConfig, Config};
use crate::ApiError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use url::Url;

/// Wait used when a rate-limited response carries no reset information
const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(3600);

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The API configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &ApiConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/vnd.github+json"),
    );
    headers.insert(
        "X-GitHub-Api-Version",
        HeaderValue::from_static("2022-11-28"),
    );

    Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Authenticated, paced GitHub client
pub struct GitHubClient {
    http: Client,
    base_url: String,
    token: String,
    retry: RetryPolicy,
    rate_limit_margin: Duration,
    pacer: Pacer,
}

impl GitHubClient {
    /// Creates a client from the harvester configuration
    pub fn new(config: &Config, token: impl Into<String>) -> Result<Self, ApiError> {
        let http = build_http_client(&config.api)?;

        Ok(Self {
            http,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            retry: RetryPolicy::from_config(&config.retry),
            rate_limit_margin: Duration::from_secs(config.retry.rate_limit_margin_secs),
            pacer: Pacer::new(Duration::from_millis(config.crawler.request_delay_ms)),
        })
    }

    /// Searches repositories, one result page per call
    pub async fn search_repositories(
        &self,
        query: &str,
        sort: &str,
        order: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<SourceUnit>, ApiError> {
        let mut url = self.endpoint("/search/repositories")?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("sort", sort)
            .append_pair("order", order)
            .append_pair("per_page", &per_page.to_string())
            .append_pair("page", &page.to_string());

        let payload: Option<SearchPayload> = self.get_json(url).await?;
        Ok(payload
            .map(|p| p.items.into_iter().map(SourceUnit::from).collect())
            .unwrap_or_default())
    }

    /// Looks up a single repository by `owner/name`
    pub async fn get_repository(&self, full_name: &str) -> Result<SourceUnit, ApiError> {
        let url = self.endpoint(&format!("/repos/{}", full_name))?;
        let url_str = url.to_string();

        match self.get_json::<RepoPayload>(url).await? {
            Some(payload) => Ok(payload.into()),
            None => Err(ApiError::Status {
                url: url_str,
                status: StatusCode::CONFLICT.as_u16(),
            }),
        }
    }

    /// Lists one page of commits
    ///
    /// An empty or uninitialized repository (HTTP 409) yields an empty page.
    pub async fn list_commits(
        &self,
        unit: &SourceUnit,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<CommitSummary>, ApiError> {
        let mut url = self.endpoint(&format!("/repos/{}/{}/commits", unit.owner, unit.name))?;
        url.query_pairs_mut()
            .append_pair("per_page", &per_page.to_string())
            .append_pair("page", &page.to_string());

        Ok(self.get_json(url).await?.unwrap_or_default())
    }

    /// Fetches a commit with its changed files
    ///
    /// Returns `Ok(None)` when the API reports the resource as empty.
    pub async fn get_commit_detail(
        &self,
        unit: &SourceUnit,
        sha: &str,
    ) -> Result<Option<CommitDetail>, ApiError> {
        let url = self.endpoint(&format!(
            "/repos/{}/{}/commits/{}",
            unit.owner, unit.name, sha
        ))?;
        self.get_json(url).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(Url::parse(&format!("{}{}", self.base_url, path))?)
    }

    /// GETs `url` and decodes the JSON body
    ///
    /// Rate-limit waits repeat the call without touching the retry budget.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, ApiError> {
        let client = self;
        let target = &url;

        loop {
            let result =
                with_backoff(&self.retry, ApiError::is_retryable, move || client.send_once(target))
                    .await;

            match result {
                Err(ApiError::RateLimited { url, wait }) => {
                    tracing::warn!("Rate limited on {}, sleeping {}s", url, wait.as_secs());
                    tokio::time::sleep(wait).await;
                }
                Ok(Some(body)) => {
                    return serde_json::from_str(&body)
                        .map(Some)
                        .map_err(|e| ApiError::Decode {
                            url: url.to_string(),
                            message: e.to_string(),
                        })
                }
                Ok(None) => return Ok(None),
                Err(e) => return Err(e),
            }
        }
    }

    /// Sends one request and classifies the response
    async fn send_once(&self, url: &Url) -> Result<Option<String>, ApiError> {
        self.pacer.wait_turn().await;
        tracing::trace!("GET {}", url);

        let response = self
            .http
            .get(url.clone())
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|source| ApiError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();

        if status == StatusCode::CONFLICT {
            tracing::debug!("{} reported an empty resource", url);
            return Ok(None);
        }

        if is_rate_limited(status, response.headers()) {
            return Err(ApiError::RateLimited {
                url: url.to_string(),
                wait: rate_limit_wait(response.headers(), unix_now(), self.rate_limit_margin),
            });
        }

        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| ApiError::Http {
            url: url.to_string(),
            source,
        })?;
        Ok(Some(body))
    }
}

/// Decides whether a response means "slow down"
///
/// 429 always does. 403 does unless the response says quota is left, which
/// is how GitHub reports plain permission failures.
fn is_rate_limited(status: StatusCode, headers: &HeaderMap) -> bool {
    match status {
        StatusCode::TOO_MANY_REQUESTS => true,
        StatusCode::FORBIDDEN => {
            if headers.contains_key("retry-after") {
                return true;
            }
            match header_u64(headers, "x-ratelimit-remaining") {
                Some(remaining) => remaining == 0,
                None => true,
            }
        }
        _ => false,
    }
}

/// Computes how long to sleep before repeating a rate-limited request
///
/// `Retry-After` wins over `X-RateLimit-Reset`; with neither header the
/// wait is one hour. The margin is always added.
fn rate_limit_wait(headers: &HeaderMap, now_epoch: u64, margin: Duration) -> Duration {
    let base = if let Some(secs) = header_u64(headers, "retry-after") {
        Duration::from_secs(secs)
    } else if let Some(reset) = header_u64(headers, "x-ratelimit-reset") {
        Duration::from_secs(reset.saturating_sub(now_epoch))
    } else {
        DEFAULT_RATE_LIMIT_WAIT
    };
    base + margin
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
