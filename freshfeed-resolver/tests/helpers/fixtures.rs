//! Builders for posts, catalog records and wired-up pipelines

use sqlx::SqlitePool;
use std::sync::Arc;

use freshfeed_resolver::models::{FeedQuery, RawPost, RequestKind};
use freshfeed_resolver::services::catalog_client::{
    AlbumRecord, ArtistRecord, ExternalUrls, Image, Paging, TrackRecord, TrackRef,
};
use freshfeed_resolver::services::{
    PipelineSettings, ResolutionPipeline, SqliteCacheStore,
};

use super::fakes::{FakeCatalog, FakeFeed};

fn catalog_url(kind: &str, id: &str) -> ExternalUrls {
    ExternalUrls {
        spotify: Some(format!("https://open.spotify.com/{}/{}", kind, id)),
    }
}

pub fn post(id: &str, title: &str, url: &str) -> RawPost {
    RawPost {
        id: id.to_string(),
        title: title.to_string(),
        selftext: String::new(),
        url: url.to_string(),
        score: 10,
        permalink: format!("/r/hiphopheads/comments/{}/", id),
    }
}

/// A post linking a catalog album directly
pub fn album_post(id: &str, album_id: &str) -> RawPost {
    post(
        id,
        "[FRESH ALBUM] Artist - Record",
        &format!("https://open.spotify.com/album/{}?si=share", album_id),
    )
}

/// A post with only a title to search on
pub fn text_post(id: &str, title: &str) -> RawPost {
    post(id, title, &format!("https://www.reddit.com/r/hiphopheads/comments/{}/", id))
}

pub fn album_record(id: &str, name: &str, album_type: &str, total_tracks: u32) -> AlbumRecord {
    AlbumRecord {
        id: id.to_string(),
        name: name.to_string(),
        record_type: "album".to_string(),
        album_type: Some(album_type.to_string()),
        total_tracks: Some(total_tracks),
        images: vec![Image {
            url: format!("https://i.scdn.co/image/{}", id),
        }],
        artists: vec![ArtistRecord {
            id: Some("ar1".to_string()),
            name: "Artist".to_string(),
            external_urls: catalog_url("artist", "ar1"),
        }],
        release_date: Some("2024-05-10".to_string()),
        external_urls: catalog_url("album", id),
        tracks: Some(Paging {
            items: vec![TrackRef {
                id: format!("{}T1", id),
            }],
        }),
    }
}

pub fn track_record(id: &str, name: &str, album: AlbumRecord) -> TrackRecord {
    TrackRecord {
        id: id.to_string(),
        name: name.to_string(),
        record_type: "track".to_string(),
        artists: album.artists.clone(),
        album: Some(album),
        external_urls: catalog_url("track", id),
    }
}

pub fn query(kind: RequestKind) -> FeedQuery {
    FeedQuery {
        source: "hiphopheads".to_string(),
        kind,
        sort: "new".to_string(),
        time_range: "week".to_string(),
        page: 0,
        after: None,
        before: None,
    }
}

/// SQLite cache over an in-memory database
pub async fn memory_cache() -> Arc<SqliteCacheStore> {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    freshfeed_resolver::db::init_tables(&pool)
        .await
        .expect("Failed to create tables");
    Arc::new(SqliteCacheStore::new(pool))
}

pub fn pipeline(
    feed: Arc<FakeFeed>,
    catalog: Arc<FakeCatalog>,
    cache: Arc<SqliteCacheStore>,
) -> ResolutionPipeline {
    pipeline_with(feed, catalog, cache, PipelineSettings::default())
}

pub fn pipeline_with(
    feed: Arc<FakeFeed>,
    catalog: Arc<FakeCatalog>,
    cache: Arc<SqliteCacheStore>,
    settings: PipelineSettings,
) -> ResolutionPipeline {
    ResolutionPipeline::new(feed, catalog, cache, settings)
}
