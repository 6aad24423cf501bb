//! Forum feed client
//!
//! Issues one paginated search against the forum source and returns the
//! page's posts with their pagination cursors. No retries.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::models::{FeedPage, FeedQuery, RawPost, RequestKind};

const USER_AGENT: &str = concat!("freshfeed/", env!("CARGO_PKG_VERSION"));

/// Posts requested per page
pub const FEED_PAGE_SIZE: u32 = 50;

/// Highest page index whose forward result count fits in a `u32`
pub const MAX_PAGE: u32 = u32::MAX / FEED_PAGE_SIZE - 1;

const ALBUM_FILTER: &str =
    r#"flair_name:"FRESH ALBUM" OR "FRESH ALBUM" OR "FRESH EP" OR "FRESH MIXTAPE""#;
const FRESH_FILTER: &str = r#"flair_name:"FRESH" OR "FRESH" -flair_name:"FRESH ALBUM" -"FRESH ALBUM" -"FRESH EP" -"FRESH MIXTAPE" -"VIDEO""#;

/// Feed fetch errors. Fatal for the request that hit them.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Source of forum posts
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_page(&self, query: &FeedQuery) -> Result<FeedPage, FeedError>;

    /// Host prefixed to post permalinks
    fn permalink_base(&self) -> &str;
}

/// Search predicate for a request kind
pub fn search_filter(kind: RequestKind) -> &'static str {
    match kind {
        RequestKind::Album => ALBUM_FILTER,
        RequestKind::Track => FRESH_FILTER,
    }
}

/// Number of results already seen, sent so the source returns the right page.
///
/// Moving backward (a `before` cursor is present) counts the current page
/// index; moving forward counts one page more.
pub fn result_count(page: u32, before: Option<&str>) -> u32 {
    match before {
        Some(_) => page.saturating_mul(FEED_PAGE_SIZE),
        None => page.saturating_add(1).saturating_mul(FEED_PAGE_SIZE),
    }
}

/// `r/<name>` path for a source given with or without the prefix
pub fn source_path(source: &str) -> String {
    let name = source.trim().trim_matches('/');
    let name = name.strip_prefix("r/").unwrap_or(name);
    format!("r/{}", name)
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<ListingChild>,
    #[serde(default)]
    after: Option<String>,
    #[serde(default)]
    before: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: RawPost,
}

impl From<Listing> for FeedPage {
    fn from(listing: Listing) -> Self {
        FeedPage {
            posts: listing.data.children.into_iter().map(|c| c.data).collect(),
            after: listing.data.after,
            before: listing.data.before,
        }
    }
}

/// HTTP forum client
pub struct RedditClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl RedditClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FeedError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn search_url(&self, source: &str) -> String {
        format!("{}/{}/search.json", self.base_url, source_path(source))
    }
}

#[async_trait]
impl FeedSource for RedditClient {
    async fn fetch_page(&self, query: &FeedQuery) -> Result<FeedPage, FeedError> {
        let url = self.search_url(&query.source);
        let limit = FEED_PAGE_SIZE.to_string();
        let count = result_count(query.page, query.before.as_deref()).to_string();

        let mut params: Vec<(&str, &str)> = vec![
            ("q", search_filter(query.kind)),
            ("sort", query.sort.as_str()),
            ("t", query.time_range.as_str()),
            ("restrict_sr", "1"),
            ("limit", limit.as_str()),
            ("count", count.as_str()),
        ];
        if let Some(after) = query.after.as_deref() {
            params.push(("after", after));
        }
        if let Some(before) = query.before.as_deref() {
            params.push(("before", before));
        }

        tracing::debug!(url = %url, page = query.page, count = %count, "Querying feed source");

        let response = self
            .http_client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| FeedError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(FeedError::ApiError(status.as_u16(), error_text));
        }

        let listing: Listing = response
            .json()
            .await
            .map_err(|e| FeedError::ParseError(e.to_string()))?;

        let page = FeedPage::from(listing);
        tracing::debug!(posts = page.posts.len(), "Feed page received");
        Ok(page)
    }

    fn permalink_base(&self) -> &str {
        &self.base_url
    }
}
