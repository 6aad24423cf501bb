//! Feed page resolution
//!
//! Fetches one page of posts, reuses cached resolutions, resolves the rest
//! against the catalog, persists the new outcomes and reassembles the page
//! in feed order.
//!
//! Only a feed fetch failure or a cache read failure aborts a run. Every
//! other failure drops the affected items and the run continues:
//! - malformed catalog links drop the post during normalization
//! - a failed bulk lookup drops that batch
//! - a failed search drops that item
//! - an enrichment failure drops that item without caching it, so the
//!   next run looks it up again

use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

use super::cache_gateway::CacheStore;
use super::catalog_client::CatalogApi;
use super::catalog_matcher::{select_album, select_track, Candidate};
use super::content_filter::ContentFilter;
use super::enrichment::{enrich_album, enrich_candidate, enrich_track};
use super::feed_fetcher::{FeedError, FeedSource};
use super::text_normalizer::normalize_posts;
use crate::models::{FeedItem, FeedQuery, RequestKind, ResolvedItem, ResolvedPage};

/// Catalog ceiling for one bulk album lookup
pub const ALBUM_BATCH_SIZE: usize = 20;

/// Catalog ceiling for one bulk track lookup
pub const TRACK_BATCH_SIZE: usize = 50;

/// An album linked from a track request with more tracks than this is a
/// full album posted by mistake and is never surfaced
pub const MAX_TRACKS_FOR_TRACK_REQUEST: u32 = 2;

/// Errors that abort a whole run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Feed fetch failed: {0}")]
    Fetch(#[from] FeedError),

    #[error("Cache unavailable: {0}")]
    Cache(#[from] freshfeed_common::Error),
}

/// Tunables for a pipeline instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub album_batch_size: usize,
    pub track_batch_size: usize,
    pub filter: ContentFilter,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            album_batch_size: ALBUM_BATCH_SIZE,
            track_batch_size: TRACK_BATCH_SIZE,
            filter: ContentFilter::default(),
        }
    }
}

/// A direct-link item waiting for a bulk lookup
#[derive(Debug, Clone, PartialEq)]
pub struct DirectLookup {
    pub item: FeedItem,
    pub catalog_id: String,
}

/// Uncached items split by how they will be resolved
#[derive(Debug, Default, PartialEq)]
pub struct LookupPlan {
    pub albums: Vec<DirectLookup>,
    pub tracks: Vec<DirectLookup>,
    pub free_text: Vec<FeedItem>,
}

impl LookupPlan {
    pub fn len(&self) -> usize {
        self.albums.len() + self.tracks.len() + self.free_text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split items into cached hits and items still to resolve.
///
/// Cached hits carry the fresh forum info of this fetch; their catalog data
/// is whatever was stored first.
pub fn split_cached(
    items: Vec<FeedItem>,
    mut cached: HashMap<String, ResolvedItem>,
) -> (Vec<ResolvedItem>, Vec<FeedItem>) {
    let mut hits = Vec::new();
    let mut misses = Vec::new();

    for item in items {
        match cached.remove(&item.id) {
            Some(hit) => hits.push(hit.with_reddit_info(item.reddit_info)),
            None => misses.push(item),
        }
    }

    (hits, misses)
}

/// Group uncached items by lookup path.
///
/// Direct links to anything other than an album or a track cannot be
/// bulk-resolved and are dropped.
pub fn plan_lookups(items: Vec<FeedItem>) -> LookupPlan {
    let mut plan = LookupPlan::default();

    for item in items {
        let Some(catalog_ref) = item.direct_ref().cloned() else {
            plan.free_text.push(item);
            continue;
        };

        let lookup = DirectLookup {
            catalog_id: catalog_ref.catalog_id,
            item,
        };
        match catalog_ref.catalog_type.as_str() {
            "album" => plan.albums.push(lookup),
            "track" => plan.tracks.push(lookup),
            other => {
                tracing::warn!(
                    post_id = %lookup.item.id,
                    catalog_type = other,
                    "Unsupported catalog link type, dropping post"
                );
            }
        }
    }

    plan
}

/// Order `pool` by `order`, dropping ids with no entry and every item whose
/// catalog URL was already emitted.
pub fn reassemble(order: &[String], pool: Vec<ResolvedItem>) -> Vec<ResolvedItem> {
    let mut by_id: HashMap<String, ResolvedItem> = HashMap::with_capacity(pool.len());
    for item in pool {
        by_id.entry(item.id().to_string()).or_insert(item);
    }

    let mut seen_urls = HashSet::new();
    order
        .iter()
        .filter_map(|id| by_id.remove(id))
        .filter(|item| {
            item.catalog_info()
                .is_some_and(|info| seen_urls.insert(info.catalog_url.clone()))
        })
        .collect()
}

/// Resolves feed pages against the catalog through the cache
pub struct ResolutionPipeline {
    feed: Arc<dyn FeedSource>,
    catalog: Arc<dyn CatalogApi>,
    cache: Arc<dyn CacheStore>,
    settings: PipelineSettings,
}

impl ResolutionPipeline {
    pub fn new(
        feed: Arc<dyn FeedSource>,
        catalog: Arc<dyn CatalogApi>,
        cache: Arc<dyn CacheStore>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            feed,
            catalog,
            cache,
            settings,
        }
    }

    /// Resolve one feed page. `auth` is forwarded to the catalog untouched.
    pub async fn run(&self, query: &FeedQuery, auth: &str) -> Result<ResolvedPage, PipelineError> {
        let page = self.feed.fetch_page(query).await?;
        let items = normalize_posts(&page.posts, query.kind, self.feed.permalink_base());
        let fetched = items.len();

        let ids: Vec<String> = items.iter().map(|item| item.id.clone()).collect();
        let cached = self.cache.lookup_many(&ids).await?;
        let (hits, misses) = split_cached(items, cached);

        // Known-unresolvable items never reappear, even when re-fetched
        let unresolvable: HashSet<&str> = hits
            .iter()
            .filter(|hit| !hit.is_resolved())
            .map(|hit| hit.id())
            .collect();
        let order: Vec<String> = ids
            .iter()
            .filter(|id| !unresolvable.contains(id.as_str()))
            .cloned()
            .collect();

        let plan = plan_lookups(misses);
        tracing::debug!(
            cached = hits.len(),
            albums = plan.albums.len(),
            tracks = plan.tracks.len(),
            free_text = plan.free_text.len(),
            "Resolution plan"
        );

        let mut fresh = Vec::with_capacity(plan.len());
        fresh.extend(self.resolve_albums(&plan.albums, auth).await);
        fresh.extend(self.resolve_tracks(&plan.tracks, auth).await);
        fresh.extend(self.resolve_free_text(&plan.free_text, auth).await);

        if !fresh.is_empty() {
            if let Err(e) = self.cache.persist_many(&fresh).await {
                tracing::warn!(items = fresh.len(), error = %e, "Failed to cache resolved items");
            }
        }

        let fresh_count = fresh.len();
        let pool: Vec<ResolvedItem> = hits
            .into_iter()
            .filter(ResolvedItem::is_resolved)
            .chain(fresh)
            .filter(|item| self.settings.filter.permits(item))
            .collect();
        let results = reassemble(&order, pool);

        tracing::info!(
            source = %query.source,
            kind = query.kind.as_str(),
            fetched,
            resolved_now = fresh_count,
            returned = results.len(),
            "Feed page resolved"
        );

        Ok(ResolvedPage {
            results,
            after: page.after,
            before: page.before,
        })
    }

    async fn resolve_albums(&self, lookups: &[DirectLookup], auth: &str) -> Vec<ResolvedItem> {
        let mut resolved = Vec::new();

        for batch in lookups.chunks(self.settings.album_batch_size.max(1)) {
            let ids: Vec<String> = batch.iter().map(|l| l.catalog_id.clone()).collect();
            let records = match self.catalog.get_albums(&ids, auth).await {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(batch = ids.len(), error = %e, "Album lookup failed, dropping batch");
                    continue;
                }
            };

            let mut records = records.into_iter();
            for lookup in batch {
                let Some(album) = records.next().flatten() else {
                    tracing::warn!(post_id = %lookup.item.id, catalog_id = %lookup.catalog_id, "No album record returned");
                    continue;
                };

                let kind = lookup.item.request_kind;
                if kind == RequestKind::Track
                    && album.total_tracks.is_some_and(|n| n > MAX_TRACKS_FOR_TRACK_REQUEST)
                {
                    tracing::debug!(post_id = %lookup.item.id, "Full album linked from a track post");
                    resolved.push(ResolvedItem::unresolved(lookup.item.clone()));
                    continue;
                }

                match enrich_album(self.catalog.as_ref(), auth, &album, kind).await {
                    Ok(info) => resolved.push(ResolvedItem::resolved(lookup.item.clone(), info)),
                    Err(e) => {
                        tracing::warn!(post_id = %lookup.item.id, error = %e, "Album enrichment failed")
                    }
                }
            }
        }

        resolved
    }

    async fn resolve_tracks(&self, lookups: &[DirectLookup], auth: &str) -> Vec<ResolvedItem> {
        let mut resolved = Vec::new();

        for batch in lookups.chunks(self.settings.track_batch_size.max(1)) {
            let ids: Vec<String> = batch.iter().map(|l| l.catalog_id.clone()).collect();
            let records = match self.catalog.get_tracks(&ids, auth).await {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(batch = ids.len(), error = %e, "Track lookup failed, dropping batch");
                    continue;
                }
            };

            let mut records = records.into_iter();
            for lookup in batch {
                let Some(track) = records.next().flatten() else {
                    tracing::warn!(post_id = %lookup.item.id, catalog_id = %lookup.catalog_id, "No track record returned");
                    continue;
                };

                match enrich_track(&track) {
                    Ok(info) => resolved.push(ResolvedItem::resolved(lookup.item.clone(), info)),
                    Err(e) => {
                        tracing::warn!(post_id = %lookup.item.id, error = %e, "Track enrichment failed")
                    }
                }
            }
        }

        resolved
    }

    /// One search per item, all in flight together. Results are matched to
    /// their item by position, not by completion order.
    async fn resolve_free_text(&self, items: &[FeedItem], auth: &str) -> Vec<ResolvedItem> {
        let searches = items.iter().map(|item| self.search_one(item, auth));
        join_all(searches).await.into_iter().flatten().collect()
    }

    async fn search_one(&self, item: &FeedItem, auth: &str) -> Option<ResolvedItem> {
        let terms = item.search_terms();
        let response = match self.catalog.search(&terms, item.request_kind, auth).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(post_id = %item.id, error = %e, "Catalog search failed");
                return None;
            }
        };

        let info = match item.request_kind {
            RequestKind::Album => {
                let albums = response.album_items();
                let selected = select_album(
                    &albums,
                    item.reddit_info.album.as_deref(),
                    Some(item.reddit_info.artist.as_str()),
                );
                match selected {
                    Some(album) => {
                        enrich_candidate(self.catalog.as_ref(), auth, Candidate::Album(album), item.request_kind)
                            .await
                    }
                    None => return Some(ResolvedItem::unresolved(item.clone())),
                }
            }
            RequestKind::Track => {
                let tracks = response.track_items();
                match select_track(&tracks) {
                    Some(candidate) => {
                        enrich_candidate(self.catalog.as_ref(), auth, candidate, item.request_kind).await
                    }
                    None => return Some(ResolvedItem::unresolved(item.clone())),
                }
            }
        };

        match info {
            Ok(info) => Some(ResolvedItem::resolved(item.clone(), info)),
            Err(e) => {
                tracing::warn!(post_id = %item.id, query = %terms, error = %e, "Search result enrichment failed");
                None
            }
        }
    }
}
