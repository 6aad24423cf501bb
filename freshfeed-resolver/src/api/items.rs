//! Resolved feed items endpoint

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderMap},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::models::{FeedQuery, RequestKind, ResolvedPage};
use crate::services::feed_fetcher::MAX_PAGE;
use crate::AppState;

const DEFAULT_SORT: &str = "new";
const DEFAULT_TIME_RANGE: &str = "week";

const SORT_KEYS: &[&str] = &["relevance", "hot", "top", "new", "comments"];
const TIME_RANGES: &[&str] = &["hour", "day", "week", "month", "year", "all"];

/// Query string of GET /items
#[derive(Debug, Default, Deserialize)]
pub struct ItemsParams {
    /// Forum source; the configured default when absent
    pub subreddit: Option<String>,
    /// `album` for album requests, anything else for tracks
    #[serde(default)]
    pub q: String,
    pub sort: Option<String>,
    pub t: Option<String>,
    #[serde(default)]
    pub page: u32,
    pub after: Option<String>,
    pub before: Option<String>,
}

impl ItemsParams {
    /// Validate and convert into a pipeline query
    pub fn into_feed_query(self, default_source: &str) -> ApiResult<FeedQuery> {
        let sort = self.sort.unwrap_or_else(|| DEFAULT_SORT.to_string());
        if !SORT_KEYS.contains(&sort.as_str()) {
            return Err(ApiError::BadRequest(format!("Unknown sort '{}'", sort)));
        }

        let time_range = self.t.unwrap_or_else(|| DEFAULT_TIME_RANGE.to_string());
        if !TIME_RANGES.contains(&time_range.as_str()) {
            return Err(ApiError::BadRequest(format!("Unknown time range '{}'", time_range)));
        }

        if self.page > MAX_PAGE {
            return Err(ApiError::BadRequest(format!(
                "Page {} is out of range (max {})",
                self.page, MAX_PAGE
            )));
        }

        let source = self
            .subreddit
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| default_source.to_string());

        Ok(FeedQuery {
            source,
            kind: RequestKind::from_query(&self.q),
            sort,
            time_range,
            page: self.page,
            after: cursor(self.after, "after"),
            before: cursor(self.before, "before"),
        })
    }
}

/// Empty cursors and the literal placeholder names some clients echo back
/// mean "no cursor"
fn cursor(value: Option<String>, placeholder: &str) -> Option<String> {
    value.filter(|v| !v.is_empty() && v != placeholder)
}

/// GET /items
///
/// The `Authorization` header is forwarded untouched to the catalog.
/// A query string that does not deserialize is a 400 in the API error shape.
pub async fn get_items(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: Result<Query<ItemsParams>, QueryRejection>,
) -> ApiResult<Json<ResolvedPage>> {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Authorization header required".to_string()))?
        .to_string();

    let Query(params) = params.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let query = params.into_feed_query(&state.default_source)?;
    tracing::debug!(source = %query.source, kind = query.kind.as_str(), page = query.page, "GET /items");

    let page = state.pipeline.run(&query, &auth).await?;
    Ok(Json(page))
}

/// Build item routes
pub fn item_routes() -> Router<AppState> {
    Router::new().route("/items", get(get_items))
}
