//! Review operations and rating upkeep.

use crate::catalog::Product;
use crate::error::CommerceError;
use crate::ids::{ProductId, ReviewId, UserId};
use crate::reviews::{ProductReview, RatingSummary, ReviewEdit, ReviewStats};
use crate::store::{CatalogRepository, ReviewRepository, StoreResult};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// Fields for creating a review.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub rating: i64,
    #[serde(default)]
    pub review_text: String,
    #[serde(default)]
    pub is_verified_purchase: bool,
}

/// Review operations. Every change recomputes the product's rating.
#[derive(Clone)]
pub struct ReviewService {
    catalog: Arc<dyn CatalogRepository>,
    reviews: Arc<dyn ReviewRepository>,
}

impl ReviewService {
    pub fn new(catalog: Arc<dyn CatalogRepository>, reviews: Arc<dyn ReviewRepository>) -> Self {
        Self { catalog, reviews }
    }

    /// Reviews of a product, newest first.
    pub async fn list(&self, product_id: &ProductId) -> StoreResult<Vec<ProductReview>> {
        self.require_product(product_id).await?;
        self.reviews.reviews_for(product_id).await
    }

    /// Create the caller's review of an active product.
    pub async fn create(
        &self,
        product_id: &ProductId,
        user_id: Option<&UserId>,
        input: NewReview,
    ) -> StoreResult<(ProductReview, RatingSummary)> {
        let user_id = user_id.ok_or_else(|| CommerceError::Unauthorized("sign in to review".into()))?;
        match self.catalog.get_product(product_id).await? {
            Some(p) if p.is_active => {}
            _ => return Err(CommerceError::ProductNotFound(product_id.to_string())),
        }

        let mut review =
            ProductReview::new(product_id.clone(), user_id.clone(), input.rating, input.review_text)?;
        review.is_verified_purchase = input.is_verified_purchase;

        let review = self.reviews.insert_review(review).await?;
        let summary = self.reviews.refresh_rating(product_id).await?;
        info!(
            product_id = %product_id,
            review_id = %review.id,
            rating_average = summary.average,
            rating_count = summary.count,
            "review created"
        );
        Ok((review, summary))
    }

    /// Edit one of the caller's reviews.
    pub async fn update(
        &self,
        review_id: &ReviewId,
        user_id: Option<&UserId>,
        edit: &ReviewEdit,
    ) -> StoreResult<ProductReview> {
        let mut review = self.owned_review(review_id, user_id).await?;
        review.edit(edit)?;
        self.reviews.save_review(&review).await?;
        self.reviews.refresh_rating(&review.product_id).await?;
        info!(review_id = %review_id, "review updated");
        Ok(review)
    }

    /// Delete one of the caller's reviews.
    pub async fn delete(&self, review_id: &ReviewId, user_id: Option<&UserId>) -> StoreResult<()> {
        let review = self.owned_review(review_id, user_id).await?;
        self.reviews.delete_review(review_id).await?;
        self.reviews.refresh_rating(&review.product_id).await?;
        info!(review_id = %review_id, "review deleted");
        Ok(())
    }

    /// Count and distribution of a product's reviews.
    pub async fn stats(&self, product_id: &ProductId) -> StoreResult<ReviewStats> {
        let product = self.require_product(product_id).await?;
        let reviews = self.reviews.reviews_for(product_id).await?;
        Ok(ReviewStats::new(&reviews, product.rating_average))
    }

    async fn require_product(&self, product_id: &ProductId) -> StoreResult<Product> {
        self.catalog
            .get_product(product_id)
            .await?
            .ok_or_else(|| CommerceError::ProductNotFound(product_id.to_string()))
    }

    /// Reviews are only visible for editing to their author.
    async fn owned_review(&self, review_id: &ReviewId, user_id: Option<&UserId>) -> StoreResult<ProductReview> {
        let user_id = user_id.ok_or_else(|| CommerceError::Unauthorized("sign in to edit reviews".into()))?;
        match self.reviews.get_review(review_id).await? {
            Some(review) if review.user_id == *user_id => Ok(review),
            _ => Err(CommerceError::ReviewNotFound(review_id.to_string())),
        }
    }
}
