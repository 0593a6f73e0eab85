//! Product reviews.

use crate::current_timestamp;
use crate::error::CommerceError;
use crate::ids::{ProductId, ReviewId, UserId};
use serde::{Deserialize, Serialize};

/// Lowest allowed rating.
pub const MIN_RATING: i64 = 1;
/// Highest allowed rating.
pub const MAX_RATING: i64 = 5;

/// A user's review of a product. One per `(product_id, user_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductReview {
    pub id: ReviewId,
    pub product_id: ProductId,
    /// Author.
    pub user_id: UserId,
    /// 1 to 5 stars.
    pub rating: i64,
    pub review_text: String,
    pub is_verified_purchase: bool,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Unix timestamp of last update.
    pub updated_at: i64,
}

impl ProductReview {
    /// Create a review, validating the rating.
    pub fn new(
        product_id: ProductId,
        user_id: UserId,
        rating: i64,
        review_text: impl Into<String>,
    ) -> Result<Self, CommerceError> {
        validate_rating(rating)?;
        let now = current_timestamp();
        Ok(Self {
            id: ReviewId::generate(),
            product_id,
            user_id,
            rating,
            review_text: review_text.into(),
            is_verified_purchase: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply an edit. Nothing changes if the new rating is out of range.
    pub fn edit(&mut self, edit: &ReviewEdit) -> Result<(), CommerceError> {
        if let Some(rating) = edit.rating {
            validate_rating(rating)?;
            self.rating = rating;
        }
        if let Some(text) = &edit.review_text {
            self.review_text = text.clone();
        }
        self.updated_at = current_timestamp();
        Ok(())
    }
}

/// Fields a review author may change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReviewEdit {
    pub rating: Option<i64>,
    pub review_text: Option<String>,
}

/// Check that a rating is between 1 and 5.
pub fn validate_rating(rating: i64) -> Result<(), CommerceError> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(CommerceError::validation(format!(
            "rating must be between {} and {}, got {}",
            MIN_RATING, MAX_RATING, rating
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
    }

    #[test]
    fn test_edit_is_all_or_nothing() {
        let mut review =
            ProductReview::new(ProductId::new("p1"), UserId::new("u1"), 4, "good").unwrap();
        let bad = ReviewEdit {
            rating: Some(9),
            review_text: Some("changed".into()),
        };
        assert!(review.edit(&bad).is_err());
        assert_eq!(review.rating, 4);
        assert_eq!(review.review_text, "good");

        review
            .edit(&ReviewEdit {
                rating: Some(2),
                review_text: None,
            })
            .unwrap();
        assert_eq!(review.rating, 2);
        assert_eq!(review.review_text, "good");
    }
}
