//! Resolved item persistence
//!
//! Records are write-once: inserting an id that already exists is a no-op,
//! so concurrent requests resolving the same post keep the first record.

use freshfeed_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::models::{FeedItem, RequestKind, Resolution, ResolvedItem};

/// Load every stored item whose id is in `ids`. Missing ids are skipped.
pub async fn load_items(pool: &SqlitePool, ids: &[String]) -> Result<Vec<ResolvedItem>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder = QueryBuilder::<Sqlite>::new(
        "SELECT id, request_kind, reddit_info, source, resolved, catalog_info \
         FROM music_items WHERE id IN (",
    );
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(id.as_str());
    }
    separated.push_unseparated(")");

    let rows = builder.build().fetch_all(pool).await?;
    rows.iter().map(item_from_row).collect()
}

/// Insert items, ignoring ids that are already stored.
///
/// Runs in one transaction. Returns the number of rows written.
pub async fn insert_items(pool: &SqlitePool, items: &[ResolvedItem]) -> Result<u64> {
    if items.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for item in items {
        let catalog_info = item.catalog_info().map(serde_json::to_string).transpose()?;

        let result = sqlx::query(
            r#"
            INSERT INTO music_items (id, request_kind, reddit_info, source, resolved, catalog_info, created_at)
            VALUES (?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&item.item.id)
        .bind(item.item.request_kind.as_str())
        .bind(serde_json::to_string(&item.item.reddit_info)?)
        .bind(serde_json::to_string(&item.item.source)?)
        .bind(item.is_resolved())
        .bind(catalog_info)
        .execute(&mut *tx)
        .await?;

        inserted += result.rows_affected();
    }

    tx.commit().await?;

    Ok(inserted)
}

fn item_from_row(row: &SqliteRow) -> Result<ResolvedItem> {
    let kind: String = row.try_get("request_kind")?;
    let request_kind = RequestKind::parse(&kind)
        .ok_or_else(|| Error::Internal(format!("Unknown request kind in cache: {}", kind)))?;

    let reddit_info: String = row.try_get("reddit_info")?;
    let source: String = row.try_get("source")?;
    let resolved: bool = row.try_get("resolved")?;
    let catalog_info: Option<String> = row.try_get("catalog_info")?;

    let item = FeedItem {
        id: row.try_get("id")?,
        request_kind,
        reddit_info: serde_json::from_str(&reddit_info)?,
        source: serde_json::from_str(&source)?,
    };

    let resolution = match (resolved, catalog_info) {
        (true, Some(info)) => Resolution::Resolved(serde_json::from_str(&info)?),
        (true, None) => {
            return Err(Error::Internal(format!(
                "Cached item {} is resolved but has no catalog info",
                item.id
            )))
        }
        (false, _) => Resolution::Unresolved,
    };

    Ok(ResolvedItem { item, resolution })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CatalogInfo, CatalogLink, CatalogRef, ItemSource, RedditInfo};

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        crate::db::init_tables(&pool).await.unwrap();
        pool
    }

    fn feed_item(id: &str) -> FeedItem {
        FeedItem {
            id: id.to_string(),
            request_kind: RequestKind::Album,
            reddit_info: RedditInfo {
                artist: "Artist".to_string(),
                album: Some("Record".to_string()),
                score: 7,
                url: format!("https://www.reddit.com/r/x/{}", id),
            },
            source: ItemSource::DirectLink(CatalogRef {
                catalog_id: "AAAAAAAAAAAAAAAAAAAAAA".to_string(),
                catalog_type: "album".to_string(),
            }),
        }
    }

    fn info(name: &str) -> CatalogInfo {
        CatalogInfo {
            name: name.to_string(),
            image_url: "https://img/1".to_string(),
            release_date: Some("2024-01-01".to_string()),
            catalog_url: "https://open.spotify.com/album/AAAAAAAAAAAAAAAAAAAAAA".to_string(),
            artist: CatalogLink {
                name: "Artist".to_string(),
                url: "https://open.spotify.com/artist/a1".to_string(),
            },
            album: CatalogLink {
                name: name.to_string(),
                url: "https://open.spotify.com/album/AAAAAAAAAAAAAAAAAAAAAA".to_string(),
            },
            item_id: "AAAAAAAAAAAAAAAAAAAAAA".to_string(),
            item_type: "album".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_load_items() {
        let pool = setup_test_db().await;
        let items = vec![
            ResolvedItem::resolved(feed_item("p1"), info("Record")),
            ResolvedItem::unresolved(feed_item("p2")),
        ];

        let inserted = insert_items(&pool, &items).await.unwrap();
        assert_eq!(inserted, 2);

        let ids = vec!["p1".to_string(), "p2".to_string(), "absent".to_string()];
        let mut loaded = load_items(&pool, &ids).await.unwrap();
        loaded.sort_by(|a, b| a.id().cmp(b.id()));

        assert_eq!(loaded, items);
    }

    #[tokio::test]
    async fn test_insert_is_write_once() {
        let pool = setup_test_db().await;

        insert_items(&pool, &[ResolvedItem::resolved(feed_item("p1"), info("First"))])
            .await
            .unwrap();
        let inserted = insert_items(&pool, &[ResolvedItem::resolved(feed_item("p1"), info("Second"))])
            .await
            .unwrap();
        assert_eq!(inserted, 0);

        let loaded = load_items(&pool, &["p1".to_string()]).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].catalog_info().unwrap().name, "First");
    }

    #[tokio::test]
    async fn test_empty_inputs() {
        let pool = setup_test_db().await;
        assert!(load_items(&pool, &[]).await.unwrap().is_empty());
        assert_eq!(insert_items(&pool, &[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_request_kind_is_rejected() {
        let pool = setup_test_db().await;
        sqlx::query(
            "INSERT INTO music_items (id, request_kind, reddit_info, source, resolved) \
             VALUES ('bad', 'playlist', '{}', '{}', 0)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let result = load_items(&pool, &["bad".to_string()]).await;
        assert!(matches!(result, Err(Error::Internal(_))));
    }
}
