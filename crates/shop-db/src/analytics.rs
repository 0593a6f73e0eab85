//! View tracking.

use crate::{Db, DbError};
use async_trait::async_trait;
use shop_commerce::analytics::ProductView;
use shop_commerce::store::{AnalyticsRepository, StoreResult};
use shop_commerce::{CommerceError, ProductId};
use std::collections::HashMap;
use tracing::debug;

#[async_trait]
impl AnalyticsRepository for Db {
    async fn record_view(&self, view: ProductView) -> StoreResult<bool> {
        let mut tx = self.pool().begin().await.map_err(DbError::from)?;
        let inserted = sqlx::query(
            "INSERT INTO product_views (product_id, user_id, ip_address, created_at) \
             SELECT ?1, ?2, ?3, ?4 WHERE EXISTS (SELECT 1 FROM products WHERE id = ?1) \
             ON CONFLICT DO NOTHING",
        )
        .bind(view.product_id.as_str())
        .bind(view.user_id.as_ref().map(|u| u.as_str()))
        .bind(&view.ip_address)
        .bind(view.created_at)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?
        .rows_affected()
            > 0;

        if inserted {
            sqlx::query("UPDATE products SET view_count = view_count + 1 WHERE id = ?")
                .bind(view.product_id.as_str())
                .execute(&mut *tx)
                .await
                .map_err(DbError::from)?;
        } else {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE id = ?)")
                    .bind(view.product_id.as_str())
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(DbError::from)?;
            if !exists {
                return Err(CommerceError::ProductNotFound(view.product_id.to_string()));
            }
        }
        tx.commit().await.map_err(DbError::from)?;

        debug!(product_id = %view.product_id, inserted, "view recorded");
        Ok(inserted)
    }

    async fn view_counts_since(&self, since: i64) -> StoreResult<HashMap<ProductId, i64>> {
        let counts: Vec<(String, i64)> = sqlx::query_as(
            "SELECT product_id, COUNT(*) FROM product_views WHERE created_at >= ? \
             GROUP BY product_id",
        )
        .bind(since)
        .fetch_all(self.pool())
        .await
        .map_err(DbError::from)?;
        Ok(counts
            .into_iter()
            .map(|(id, count)| (ProductId::new(id), count))
            .collect())
    }

    async fn product_views_since(&self, product_id: &ProductId, since: i64) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM product_views WHERE product_id = ? AND created_at >= ?",
        )
        .bind(product_id.as_str())
        .bind(since)
        .fetch_one(self.pool())
        .await
        .map_err(DbError::from)?;
        Ok(count)
    }
}
