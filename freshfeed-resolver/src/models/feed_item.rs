//! Forum posts and their normalized form

use serde::{Deserialize, Serialize};

/// Kind of release a request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Album,
    Track,
}

impl RequestKind {
    /// Map the inbound `q` parameter. Only `album` selects albums; anything
    /// else ("fresh", "track", empty) is a track request.
    pub fn from_query(q: &str) -> Self {
        if q.trim().eq_ignore_ascii_case("album") {
            RequestKind::Album
        } else {
            RequestKind::Track
        }
    }

    /// Catalog search type and stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Album => "album",
            RequestKind::Track => "track",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "album" => Some(RequestKind::Album),
            "track" => Some(RequestKind::Track),
            _ => None,
        }
    }
}

/// One post as delivered by the feed source
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawPost {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub permalink: String,
}

/// Forum-side display data extracted from a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedditInfo {
    pub artist: String,
    pub album: Option<String>,
    pub score: i64,
    /// Absolute permalink to the post
    pub url: String,
}

/// Catalog item identifier and type parsed out of a catalog URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRef {
    pub catalog_id: String,
    pub catalog_type: String,
}

/// How a post will be resolved against the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "classification", content = "directRef", rename_all = "camelCase")]
pub enum ItemSource {
    /// The post already links a catalog item
    DirectLink(CatalogRef),
    /// Needs a free-text search built from the title
    FreeText,
}

/// A normalized feed post. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    /// Source-assigned post id, unique within the feed
    pub id: String,
    pub request_kind: RequestKind,
    pub reddit_info: RedditInfo,
    pub source: ItemSource,
}

impl FeedItem {
    pub fn direct_ref(&self) -> Option<&CatalogRef> {
        match &self.source {
            ItemSource::DirectLink(catalog_ref) => Some(catalog_ref),
            ItemSource::FreeText => None,
        }
    }

    /// Query text for a free-text catalog search
    pub fn search_terms(&self) -> String {
        match &self.reddit_info.album {
            Some(album) => format!("{} {}", self.reddit_info.artist, album),
            None => self.reddit_info.artist.clone(),
        }
    }
}
