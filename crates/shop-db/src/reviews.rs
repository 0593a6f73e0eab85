//! Reviews and the stored rating aggregate.

use crate::rows::{self, REVIEW_COLUMNS};
use crate::{Db, DbError};
use async_trait::async_trait;
use shop_commerce::reviews::{ProductReview, RatingSummary};
use shop_commerce::store::{ReviewRepository, StoreResult};
use shop_commerce::{CommerceError, ProductId, ReviewId};
use sqlx::Row;
use tracing::debug;

#[async_trait]
impl ReviewRepository for Db {
    async fn insert_review(&self, review: ProductReview) -> StoreResult<ProductReview> {
        sqlx::query(
            "INSERT INTO product_reviews (id, product_id, user_id, rating, review_text, \
             is_verified_purchase, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(review.id.as_str())
        .bind(review.product_id.as_str())
        .bind(review.user_id.as_str())
        .bind(review.rating)
        .bind(&review.review_text)
        .bind(review.is_verified_purchase)
        .bind(review.created_at)
        .bind(review.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| {
            let key = format!("{}/{}", review.product_id, review.user_id);
            DbError::on_write(e, "review", &[("product and user", &key)])
        })?;
        Ok(review)
    }

    async fn get_review(&self, id: &ReviewId) -> StoreResult<Option<ProductReview>> {
        let row = sqlx::query(&format!("SELECT {} FROM product_reviews WHERE id = ?", REVIEW_COLUMNS))
            .bind(id.as_str())
            .fetch_optional(self.pool())
            .await
            .map_err(DbError::from)?;
        Ok(row.as_ref().map(rows::review).transpose()?)
    }

    async fn save_review(&self, review: &ProductReview) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE product_reviews SET rating = ?, review_text = ?, updated_at = ? WHERE id = ?",
        )
        .bind(review.rating)
        .bind(&review.review_text)
        .bind(review.updated_at)
        .bind(review.id.as_str())
        .execute(self.pool())
        .await
        .map_err(DbError::from)?;
        if result.rows_affected() == 0 {
            return Err(CommerceError::ReviewNotFound(review.id.to_string()));
        }
        Ok(())
    }

    async fn delete_review(&self, id: &ReviewId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM product_reviews WHERE id = ?")
            .bind(id.as_str())
            .execute(self.pool())
            .await
            .map_err(DbError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn reviews_for(&self, product_id: &ProductId) -> StoreResult<Vec<ProductReview>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM product_reviews WHERE product_id = ? \
             ORDER BY created_at DESC, rowid DESC",
            REVIEW_COLUMNS
        ))
        .bind(product_id.as_str())
        .fetch_all(self.pool())
        .await
        .map_err(DbError::from)?;
        Ok(rows::all(&rows, rows::review)?)
    }

    async fn refresh_rating(&self, product_id: &ProductId) -> StoreResult<RatingSummary> {
        let row = sqlx::query(
            "UPDATE products SET \
             rating_count = (SELECT COUNT(*) FROM product_reviews WHERE product_id = ?1), \
             rating_average = COALESCE(\
                 (SELECT ROUND(AVG(rating) * 100.0) / 100.0 FROM product_reviews WHERE product_id = ?1), \
                 0.0) \
             WHERE id = ?1 RETURNING rating_average, rating_count",
        )
        .bind(product_id.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| CommerceError::ProductNotFound(product_id.to_string()))?;

        let summary = RatingSummary {
            average: row.try_get("rating_average").map_err(DbError::from)?,
            count: row.try_get("rating_count").map_err(DbError::from)?,
        };
        debug!(product_id = %product_id, average = summary.average, count = summary.count, "rating refreshed");
        Ok(summary)
    }
}
