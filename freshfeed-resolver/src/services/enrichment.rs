//! Mapping of catalog records onto [`CatalogInfo`]
//!
//! Album records and track records populate the same shape. An album found
//! for a track request is narrowed to a track id where the album is a single.

use thiserror::Error;

use super::catalog_client::{AlbumRecord, CatalogApi, CatalogError, TrackRecord};
use super::catalog_matcher::Candidate;
use super::text_normalizer::{extract_catalog_ref, NormalizeError};
use crate::models::{CatalogInfo, CatalogLink, RequestKind};

/// A catalog record could not be mapped for one item.
///
/// The item is dropped from the response and not cached, so the next
/// request looks it up again.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Unexpected {0} record")]
    UnexpectedRecord(String),

    #[error("Track listing lookup failed: {0}")]
    TrackListing(#[from] CatalogError),

    #[error("Unparseable catalog URL: {0}")]
    CatalogUrl(#[from] NormalizeError),
}

/// Map an album record, resolving the item id per request kind
pub async fn enrich_album(
    catalog: &dyn CatalogApi,
    auth: &str,
    album: &AlbumRecord,
    kind: RequestKind,
) -> Result<CatalogInfo, EnrichmentError> {
    let catalog_url = required(album.external_urls.spotify.as_deref(), "external_urls.spotify")?;
    let image = album.images.first().ok_or(EnrichmentError::MissingField("images[0]"))?;
    let artist = artist_link(album.artists.first())?;
    let item_type = extract_catalog_ref(catalog_url)?.catalog_type;

    let item_id = match kind {
        RequestKind::Track if album.is_single() => {
            let listing = catalog.get_album_tracks(&album.id, auth).await?;
            listing
                .into_iter()
                .next()
                .map(|track| track.id)
                .ok_or(EnrichmentError::MissingField("album tracks[0]"))?
        }
        RequestKind::Track if album.total_tracks == Some(1) => album
            .tracks
            .as_ref()
            .and_then(|page| page.items.first())
            .map(|track| track.id.clone())
            .ok_or(EnrichmentError::MissingField("tracks.items[0]"))?,
        _ => album.id.clone(),
    };

    Ok(CatalogInfo {
        name: album.name.clone(),
        image_url: image.url.clone(),
        release_date: album.release_date.clone(),
        catalog_url: catalog_url.to_string(),
        artist,
        album: CatalogLink {
            name: album.name.clone(),
            url: catalog_url.to_string(),
        },
        item_id,
        item_type,
    })
}

/// Map a track record; display fields come from its album
pub fn enrich_track(track: &TrackRecord) -> Result<CatalogInfo, EnrichmentError> {
    if track.record_type == "album" {
        return Err(EnrichmentError::UnexpectedRecord(track.record_type.clone()));
    }

    let album = track.album.as_ref().ok_or(EnrichmentError::MissingField("album"))?;
    let catalog_url = required(track.external_urls.spotify.as_deref(), "external_urls.spotify")?;
    let album_url = required(album.external_urls.spotify.as_deref(), "album.external_urls.spotify")?;
    let image = album.images.first().ok_or(EnrichmentError::MissingField("album.images[0]"))?;
    let artist = artist_link(album.artists.first().or(track.artists.first()))?;
    let item_type = extract_catalog_ref(catalog_url)?.catalog_type;

    Ok(CatalogInfo {
        name: track.name.clone(),
        image_url: image.url.clone(),
        release_date: album.release_date.clone(),
        catalog_url: catalog_url.to_string(),
        artist,
        album: CatalogLink {
            name: album.name.clone(),
            url: album_url.to_string(),
        },
        item_id: track.id.clone(),
        item_type,
    })
}

/// Map whichever entity the matcher selected
pub async fn enrich_candidate(
    catalog: &dyn CatalogApi,
    auth: &str,
    candidate: Candidate<'_>,
    kind: RequestKind,
) -> Result<CatalogInfo, EnrichmentError> {
    match candidate {
        Candidate::Album(album) => enrich_album(catalog, auth, album, kind).await,
        Candidate::Track(track) => enrich_track(track),
    }
}

fn required<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, EnrichmentError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(EnrichmentError::MissingField(field))
}

fn artist_link(
    artist: Option<&super::catalog_client::ArtistRecord>,
) -> Result<CatalogLink, EnrichmentError> {
    let artist = artist.ok_or(EnrichmentError::MissingField("artists[0]"))?;
    let url = required(artist.external_urls.spotify.as_deref(), "artists[0].external_urls.spotify")?;
    Ok(CatalogLink {
        name: artist.name.clone(),
        url: url.to_string(),
    })
}
