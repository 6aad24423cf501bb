//! Catalog service API client
//!
//! Thin request layer over the catalog's bulk-by-id and free-text search
//! endpoints. Every call carries the caller's credential header untouched.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::models::RequestKind;

const USER_AGENT: &str = concat!("freshfeed/", env!("CARGO_PKG_VERSION"));

/// Catalog client errors
///
/// Any of these aborts the whole batch the call was made for.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Catalog rejected the credential")]
    Unauthorized,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Image {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArtistRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

/// Minimal track entry from an album's track listing
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TrackRef {
    pub id: String,
}

/// Paged list wrapper; null entries are skipped
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Paging<T> {
    #[serde(default = "Vec::new", deserialize_with = "skip_nulls")]
    pub items: Vec<T>,
}

/// Full or simplified album object
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AlbumRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub record_type: String,
    /// "album", "single" or "compilation"
    #[serde(default)]
    pub album_type: Option<String>,
    #[serde(default)]
    pub total_tracks: Option<u32>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub artists: Vec<ArtistRecord>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
    /// Only present on full album objects
    #[serde(default)]
    pub tracks: Option<Paging<TrackRef>>,
}

impl AlbumRecord {
    pub fn is_single(&self) -> bool {
        self.album_type.as_deref() == Some("single")
    }
}

/// Track object with its embedding album
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TrackRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub record_type: String,
    #[serde(default)]
    pub album: Option<AlbumRecord>,
    #[serde(default)]
    pub artists: Vec<ArtistRecord>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

impl TrackRecord {
    pub fn is_bare_track(&self) -> bool {
        self.record_type == "track"
    }

    pub fn is_on_single(&self) -> bool {
        self.album.as_ref().is_some_and(AlbumRecord::is_single)
    }
}

#[derive(Debug, Deserialize)]
struct AlbumsResponse {
    #[serde(default)]
    albums: Vec<Option<AlbumRecord>>,
}

#[derive(Debug, Deserialize)]
struct TracksResponse {
    #[serde(default)]
    tracks: Vec<Option<TrackRecord>>,
}

/// Search response; only the section for the requested type is present
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub albums: Option<Paging<AlbumRecord>>,
    #[serde(default)]
    pub tracks: Option<Paging<TrackRecord>>,
}

impl SearchResponse {
    pub fn album_items(self) -> Vec<AlbumRecord> {
        self.albums.map(|p| p.items).unwrap_or_default()
    }

    pub fn track_items(self) -> Vec<TrackRecord> {
        self.tracks.map(|p| p.items).unwrap_or_default()
    }
}

/// Catalog operations used by the resolution pipeline
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Bulk album lookup. The result is positional: entry `i` answers `ids[i]`,
    /// `None` where the catalog knows no such id.
    async fn get_albums(
        &self,
        ids: &[String],
        auth: &str,
    ) -> Result<Vec<Option<AlbumRecord>>, CatalogError>;

    /// Bulk track lookup, positional like [`CatalogApi::get_albums`]
    async fn get_tracks(
        &self,
        ids: &[String],
        auth: &str,
    ) -> Result<Vec<Option<TrackRecord>>, CatalogError>;

    /// Track listing of one album
    async fn get_album_tracks(&self, album_id: &str, auth: &str)
        -> Result<Vec<TrackRef>, CatalogError>;

    /// Free-text search for albums or tracks
    async fn search(
        &self,
        query: &str,
        kind: RequestKind,
        auth: &str,
    ) -> Result<SearchResponse, CatalogError>;
}

/// HTTP catalog client
pub struct SpotifyClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl SpotifyClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CatalogError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        auth: &str,
    ) -> Result<T, CatalogError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, "Querying catalog API");

        let response = self
            .http_client
            .get(&url)
            .query(query)
            .header(reqwest::header::AUTHORIZATION, auth)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status == 401 {
            return Err(CatalogError::Unauthorized);
        }

        if status == 429 {
            return Err(CatalogError::RateLimitExceeded);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CatalogError::ApiError(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| CatalogError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl CatalogApi for SpotifyClient {
    async fn get_albums(
        &self,
        ids: &[String],
        auth: &str,
    ) -> Result<Vec<Option<AlbumRecord>>, CatalogError> {
        let ids = ids.join(",");
        let response: AlbumsResponse = self.get_json("/albums", &[("ids", &ids)], auth).await?;
        Ok(response.albums)
    }

    async fn get_tracks(
        &self,
        ids: &[String],
        auth: &str,
    ) -> Result<Vec<Option<TrackRecord>>, CatalogError> {
        let ids = ids.join(",");
        let response: TracksResponse = self.get_json("/tracks", &[("ids", &ids)], auth).await?;
        Ok(response.tracks)
    }

    async fn get_album_tracks(
        &self,
        album_id: &str,
        auth: &str,
    ) -> Result<Vec<TrackRef>, CatalogError> {
        let path = format!("/albums/{}/tracks", album_id);
        let page: Paging<TrackRef> = self.get_json(&path, &[], auth).await?;
        Ok(page.items)
    }

    async fn search(
        &self,
        query: &str,
        kind: RequestKind,
        auth: &str,
    ) -> Result<SearchResponse, CatalogError> {
        self.get_json("/search", &[("q", query), ("type", kind.as_str())], auth)
            .await
    }
}

fn skip_nulls<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items: Vec<Option<T>> = Vec::deserialize(deserializer)?;
    Ok(items.into_iter().flatten().collect())
}
