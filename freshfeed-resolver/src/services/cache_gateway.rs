//! Boundary to the persistent resolution cache

use async_trait::async_trait;
use freshfeed_common::Result;
use sqlx::SqlitePool;
use std::collections::HashMap;

use crate::db::music_items;
use crate::models::ResolvedItem;

/// Write-once store of resolved items keyed by feed item id
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Items found for `ids`; absent ids are simply missing from the map
    async fn lookup_many(&self, ids: &[String]) -> Result<HashMap<String, ResolvedItem>>;

    /// Insert new items. Ids already stored are left untouched and the
    /// duplicate is not an error. Returns the number of rows written.
    async fn persist_many(&self, items: &[ResolvedItem]) -> Result<u64>;
}

/// SQLite-backed cache
#[derive(Clone)]
pub struct SqliteCacheStore {
    db: SqlitePool,
}

impl SqliteCacheStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CacheStore for SqliteCacheStore {
    async fn lookup_many(&self, ids: &[String]) -> Result<HashMap<String, ResolvedItem>> {
        let items = music_items::load_items(&self.db, ids).await?;
        Ok(items
            .into_iter()
            .map(|item| (item.id().to_string(), item))
            .collect())
    }

    async fn persist_many(&self, items: &[ResolvedItem]) -> Result<u64> {
        let written = music_items::insert_items(&self.db, items).await?;
        if written < items.len() as u64 {
            tracing::debug!(
                attempted = items.len(),
                written,
                "Some items were already cached"
            );
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeedItem, ItemSource, RedditInfo, RequestKind};

    fn unresolved(id: &str) -> ResolvedItem {
        ResolvedItem::unresolved(FeedItem {
            id: id.to_string(),
            request_kind: RequestKind::Track,
            reddit_info: RedditInfo {
                artist: "Artist".to_string(),
                album: None,
                score: 1,
                url: format!("https://www.reddit.com/{}", id),
            },
            source: ItemSource::FreeText,
        })
    }

    #[tokio::test]
    async fn test_lookup_returns_found_subset() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        crate::db::init_tables(&pool).await.unwrap();
        let store = SqliteCacheStore::new(pool);

        store.persist_many(&[unresolved("a"), unresolved("b")]).await.unwrap();

        let found = store
            .lookup_many(&["a".to_string(), "c".to_string()])
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert!(found.contains_key("a"));
        assert!(!found["a"].is_resolved());
    }

    #[tokio::test]
    async fn test_second_writer_is_ignored() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        crate::db::init_tables(&pool).await.unwrap();
        let store = SqliteCacheStore::new(pool);

        assert_eq!(store.persist_many(&[unresolved("a")]).await.unwrap(), 1);
        assert_eq!(
            store.persist_many(&[unresolved("a"), unresolved("b")]).await.unwrap(),
            1
        );
    }
}
