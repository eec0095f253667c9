//! HTTP collaborators for the feed engine.
//!
//! The engine itself is pure; the two traits here are its only I/O seams.
//! [`ApiClient`] implements both against the community backend's REST API.
//! Timeouts and retries live in the HTTP client configuration; the engine
//! never retries and treats any rejection as "not available".

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::constants::USER_AGENT;
use crate::feed::raw::{RawComment, RawFile, RawPost, RawUser};

/// Fetches the full detail of a poll whose options live behind a separate
/// endpoint. Rejection is non-fatal to callers.
#[async_trait]
pub trait PollDetailFetcher: Send + Sync {
    async fn fetch_poll(&self, poll_id: &str) -> Result<PollDetail>;
}

/// Fetches one page of raw feed records.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch_feed(&self, query: &FeedQuery) -> Result<FeedPage>;
}

/// Full poll payload returned by the poll-detail endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollDetail {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub options: Vec<PollDetailOption>,
    /// Explicit total; when absent the option vote counts are summed.
    #[serde(default)]
    pub total_votes: Option<i64>,
    #[serde(default)]
    pub ended_at: Option<String>,
    #[serde(default)]
    pub is_finished: Option<bool>,
}

/// One option as returned by the poll-detail endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollDetailOption {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub vote_count: Option<i64>,
}

/// One page of raw records as returned by the feed endpoint. The collections
/// are lookup tables for each other: comments reference posts, users and
/// posts reference files.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedPage {
    #[serde(default)]
    pub posts: Vec<RawPost>,
    #[serde(default)]
    pub files: Vec<RawFile>,
    #[serde(default)]
    pub users: Vec<RawUser>,
    #[serde(default)]
    pub comments: Vec<RawComment>,
}

/// Author filter, in the two wire shapes the backend distinguishes:
/// a single id is passed as a scalar, multiple ids as a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorIds {
    One(String),
    Many(Vec<String>),
}

/// Query parameters accepted by the feed endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub post_types: Option<Vec<String>>,
    pub author_ids: Option<AuthorIds>,
    pub start_date: Option<DateTime<Local>>,
    pub end_date: Option<DateTime<Local>>,
    pub order_by: Option<String>,
    pub order: Option<String>,
}

impl FeedQuery {
    /// Flatten into URL query pairs. List-valued parameters use the
    /// bracketed-key convention the backend expects.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search".to_string(), search.clone()));
        }
        if let Some(types) = &self.post_types {
            for post_type in types {
                pairs.push(("postTypes[]".to_string(), post_type.clone()));
            }
        }
        match &self.author_ids {
            Some(AuthorIds::One(id)) => pairs.push(("authorIds".to_string(), id.clone())),
            Some(AuthorIds::Many(ids)) => {
                for id in ids {
                    pairs.push(("authorIds[]".to_string(), id.clone()));
                }
            }
            None => {}
        }
        if let Some(start) = &self.start_date {
            pairs.push(("startDate".to_string(), start.to_rfc3339()));
        }
        if let Some(end) = &self.end_date {
            pairs.push(("endDate".to_string(), end.to_rfc3339()));
        }
        if let Some(order_by) = &self.order_by {
            pairs.push(("orderBy".to_string(), order_by.clone()));
        }
        if let Some(order) = &self.order {
            pairs.push(("order".to_string(), order.clone()));
        }
        pairs
    }
}

/// Reqwest-backed client for the community backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: url::Url,
}

impl ApiClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = url::Url::parse(&config.api_base_url)
            .with_context(|| format!("Invalid API base URL: {}", config.api_base_url))?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, base_url })
    }

    /// Build a client against an explicit base URL, mainly for tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let base_url = url::Url::parse(base_url)
            .with_context(|| format!("Invalid API base URL: {base_url}"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<url::Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("Invalid endpoint path: {path}"))
    }
}

#[async_trait]
impl FeedFetcher for ApiClient {
    async fn fetch_feed(&self, query: &FeedQuery) -> Result<FeedPage> {
        let url = self.endpoint("posts")?;
        let pairs = query.to_query_pairs();
        debug!(url = %url, params = pairs.len(), "Fetching feed page");

        let response = self
            .client
            .get(url)
            .query(&pairs)
            .send()
            .await
            .context("Failed to fetch feed page")?;

        if !response.status().is_success() {
            anyhow::bail!("Feed fetch failed with status {}", response.status());
        }

        response
            .json::<FeedPage>()
            .await
            .context("Failed to parse feed page body")
    }
}

#[async_trait]
impl PollDetailFetcher for ApiClient {
    async fn fetch_poll(&self, poll_id: &str) -> Result<PollDetail> {
        let url = self.endpoint(&format!("polls/{poll_id}"))?;
        debug!(url = %url, "Fetching poll detail");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to fetch poll detail")?;

        if !response.status().is_success() {
            anyhow::bail!("Poll detail fetch failed with status {}", response.status());
        }

        let body: Value = response
            .json()
            .await
            .context("Failed to parse poll detail body")?;

        // Some backend versions wrap the poll under a `poll` key.
        let poll_value = body.get("poll").cloned().unwrap_or(body);
        serde_json::from_value(poll_value).context("Unexpected poll detail shape")
    }
}
