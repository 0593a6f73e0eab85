//! Connection pool and schema setup.

use crate::DbError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

/// Connections kept open against a database file.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 8;

/// SQLite-backed store implementing every repository trait.
///
/// Cloning is cheap; clones share the pool.
#[derive(Debug, Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Open the database at `url`, creating the file if needed, and apply
    /// pending migrations.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let db = Db::connect("sqlite://shop.db").await?;
    /// ```
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = if is_memory_url(url) {
            // Every connection to a memory database sees its own empty copy.
            single_connection().connect_with(options).await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(DEFAULT_MAX_CONNECTIONS)
                .connect_with(options.journal_mode(SqliteJournalMode::Wal))
                .await?
        };

        Self::migrate(pool).await
    }

    /// A private database that lives as long as this `Db` and its clones.
    pub async fn in_memory() -> Result<Self, DbError> {
        Self::connect("sqlite::memory:").await
    }

    async fn migrate(pool: SqlitePool) -> Result<Self, DbError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("database schema up to date");
        Ok(Self { pool })
    }

    /// The underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Wait for in-flight queries and close every connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

fn single_connection() -> SqlitePoolOptions {
    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_urls_detected() {
        assert!(is_memory_url("sqlite::memory:"));
        assert!(is_memory_url("sqlite://shop.db?mode=memory"));
        assert!(!is_memory_url("sqlite://shop.db"));
    }

    #[tokio::test]
    async fn test_migrations_create_tables() {
        let db = Db::in_memory().await.unwrap();
        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE '\\_%' ESCAPE '\\' AND name NOT LIKE 'sqlite%' ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();
        assert_eq!(
            tables,
            [
                "brands",
                "cart_items",
                "carts",
                "categories",
                "product_attributes",
                "product_images",
                "product_reviews",
                "product_views",
                "products",
            ]
        );
    }

    #[tokio::test]
    async fn test_file_database_persists_across_connections() {
        let path = std::env::temp_dir().join(format!("shop-db-{}.db", std::process::id()));
        let url = format!("sqlite://{}", path.display());

        let db = Db::connect(&url).await.unwrap();
        sqlx::query("INSERT INTO brands (id, name, slug, created_at) VALUES ('b1', 'Acme', 'acme', 0)")
            .execute(db.pool())
            .await
            .unwrap();
        db.close().await;

        let reopened = Db::connect(&url).await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM brands")
            .fetch_one(reopened.pool())
            .await
            .unwrap();
        reopened.close().await;
        let _ = std::fs::remove_file(&path);
        assert_eq!(count, 1);
    }
}
