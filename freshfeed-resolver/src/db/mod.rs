//! Database access for the resolution cache

pub mod music_items;

use freshfeed_common::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
///
/// Creates the parent directory and the cache table when missing.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the cache table if it does not exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS music_items (
            id TEXT PRIMARY KEY,
            request_kind TEXT NOT NULL,
            reddit_info TEXT NOT NULL,
            source TEXT NOT NULL,
            resolved INTEGER NOT NULL,
            catalog_info TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (music_items)");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_database_pool_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("cache.db");

        let pool = init_database_pool(&db_path).await.unwrap();

        assert!(db_path.exists());
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM music_items")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_init_tables_is_idempotent() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        init_tables(&pool).await.unwrap();
        init_tables(&pool).await.unwrap();
    }
}
