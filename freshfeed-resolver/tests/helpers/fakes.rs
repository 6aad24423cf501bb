//! Fake collaborators for pipeline and API tests

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use freshfeed_resolver::models::{FeedPage, FeedQuery, RawPost, RequestKind};
use freshfeed_resolver::services::catalog_client::{
    AlbumRecord, Paging, SearchResponse, TrackRecord, TrackRef,
};
use freshfeed_resolver::services::{CatalogApi, CatalogError, FeedError, FeedSource};

pub const FEED_HOST: &str = "https://www.reddit.com";

/// Serves one fixed page and records every query it receives
pub struct FakeFeed {
    page: FeedPage,
    fail: bool,
    pub queries: Mutex<Vec<FeedQuery>>,
}

impl FakeFeed {
    pub fn new(posts: Vec<RawPost>) -> Self {
        Self {
            page: FeedPage {
                posts,
                after: None,
                before: None,
            },
            fail: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn with_cursors(mut self, after: Option<&str>, before: Option<&str>) -> Self {
        self.page.after = after.map(str::to_string);
        self.page.before = before.map(str::to_string);
        self
    }

    /// A feed whose every fetch fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn last_query(&self) -> Option<FeedQuery> {
        self.queries.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl FeedSource for FakeFeed {
    async fn fetch_page(&self, query: &FeedQuery) -> Result<FeedPage, FeedError> {
        self.queries.lock().unwrap().push(query.clone());
        if self.fail {
            return Err(FeedError::ApiError(503, "feed unavailable".to_string()));
        }
        Ok(self.page.clone())
    }

    fn permalink_base(&self) -> &str {
        FEED_HOST
    }
}

/// Catalog backed by maps, with per-id and per-query failure injection
#[derive(Default)]
pub struct FakeCatalog {
    albums: HashMap<String, AlbumRecord>,
    tracks: HashMap<String, TrackRecord>,
    listings: HashMap<String, Vec<TrackRef>>,
    searches: HashMap<String, SearchResponse>,
    failing_ids: HashSet<String>,
    failing_searches: HashSet<String>,
    /// One entry per call: `albums:<ids>`, `tracks:<ids>`, `listing:<id>`, `search:<query>`
    pub calls: Mutex<Vec<String>>,
    /// Credential seen on each call
    pub auths: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_album(mut self, album: AlbumRecord) -> Self {
        self.albums.insert(album.id.clone(), album);
        self
    }

    pub fn with_track(mut self, track: TrackRecord) -> Self {
        self.tracks.insert(track.id.clone(), track);
        self
    }

    pub fn with_listing(mut self, album_id: &str, track_ids: &[&str]) -> Self {
        let listing = track_ids
            .iter()
            .map(|id| TrackRef { id: id.to_string() })
            .collect();
        self.listings.insert(album_id.to_string(), listing);
        self
    }

    pub fn with_album_search(mut self, query: &str, albums: Vec<AlbumRecord>) -> Self {
        self.searches.insert(
            query.to_string(),
            SearchResponse {
                albums: Some(Paging { items: albums }),
                tracks: None,
            },
        );
        self
    }

    pub fn with_track_search(mut self, query: &str, tracks: Vec<TrackRecord>) -> Self {
        self.searches.insert(
            query.to_string(),
            SearchResponse {
                albums: None,
                tracks: Some(Paging { items: tracks }),
            },
        );
        self
    }

    /// Any bulk lookup including `id` fails
    pub fn failing_id(mut self, id: &str) -> Self {
        self.failing_ids.insert(id.to_string());
        self
    }

    pub fn failing_search(mut self, query: &str) -> Self {
        self.failing_searches.insert(query.to_string());
        self
    }

    /// Number of calls whose log entry starts with `prefix`
    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String, auth: &str) {
        self.calls.lock().unwrap().push(call);
        self.auths.lock().unwrap().push(auth.to_string());
    }

    fn check_batch(&self, ids: &[String]) -> Result<(), CatalogError> {
        if ids.iter().any(|id| self.failing_ids.contains(id)) {
            return Err(CatalogError::ApiError(500, "batch failed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn get_albums(
        &self,
        ids: &[String],
        auth: &str,
    ) -> Result<Vec<Option<AlbumRecord>>, CatalogError> {
        self.record(format!("albums:{}", ids.join(",")), auth);
        self.check_batch(ids)?;
        Ok(ids.iter().map(|id| self.albums.get(id).cloned()).collect())
    }

    async fn get_tracks(
        &self,
        ids: &[String],
        auth: &str,
    ) -> Result<Vec<Option<TrackRecord>>, CatalogError> {
        self.record(format!("tracks:{}", ids.join(",")), auth);
        self.check_batch(ids)?;
        Ok(ids.iter().map(|id| self.tracks.get(id).cloned()).collect())
    }

    async fn get_album_tracks(
        &self,
        album_id: &str,
        auth: &str,
    ) -> Result<Vec<TrackRef>, CatalogError> {
        self.record(format!("listing:{}", album_id), auth);
        Ok(self.listings.get(album_id).cloned().unwrap_or_default())
    }

    async fn search(
        &self,
        query: &str,
        _kind: RequestKind,
        auth: &str,
    ) -> Result<SearchResponse, CatalogError> {
        self.record(format!("search:{}", query), auth);
        if self.failing_searches.contains(query) {
            return Err(CatalogError::RateLimitExceeded);
        }
        Ok(self.searches.get(query).cloned().unwrap_or_default())
    }
}
