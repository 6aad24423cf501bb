//! Resolution results attached to feed items

use serde::{Deserialize, Serialize, Serializer};

use super::{FeedItem, RedditInfo};

/// Name and link of an artist or album in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogLink {
    pub name: String,
    pub url: String,
}

/// Catalog metadata attached to a resolved item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogInfo {
    pub name: String,
    pub image_url: String,
    pub release_date: Option<String>,
    /// Public URL of the matched catalog entry; results are deduplicated on it
    pub catalog_url: String,
    pub artist: CatalogLink,
    pub album: CatalogLink,
    pub item_id: String,
    pub item_type: String,
}

/// Outcome of resolving one feed item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Permanently unresolvable; cached so it is never looked up again
    Unresolved,
    Resolved(CatalogInfo),
}

/// A feed item with its resolution outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedItem {
    pub item: FeedItem,
    pub resolution: Resolution,
}

impl ResolvedItem {
    pub fn resolved(item: FeedItem, info: CatalogInfo) -> Self {
        Self {
            item,
            resolution: Resolution::Resolved(info),
        }
    }

    pub fn unresolved(item: FeedItem) -> Self {
        Self {
            item,
            resolution: Resolution::Unresolved,
        }
    }

    pub fn id(&self) -> &str {
        &self.item.id
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.resolution, Resolution::Resolved(_))
    }

    pub fn catalog_info(&self) -> Option<&CatalogInfo> {
        match &self.resolution {
            Resolution::Resolved(info) => Some(info),
            Resolution::Unresolved => None,
        }
    }

    /// Replace the forum-side info with a fresher copy; catalog data is kept
    pub fn with_reddit_info(mut self, reddit_info: RedditInfo) -> Self {
        self.item.reddit_info = reddit_info;
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolvedItemView<'a> {
    #[serde(flatten)]
    item: &'a FeedItem,
    resolved: bool,
    catalog_info: Option<&'a CatalogInfo>,
}

impl Serialize for ResolvedItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ResolvedItemView {
            item: &self.item,
            resolved: self.is_resolved(),
            catalog_info: self.catalog_info(),
        }
        .serialize(serializer)
    }
}
