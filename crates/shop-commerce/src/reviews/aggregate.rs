//! Rating aggregation over a product's reviews.

use crate::reviews::{ProductReview, MAX_RATING, MIN_RATING};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mean rating and review count, as stored on the product. The store
/// computes it from the product's reviews.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RatingSummary {
    /// Mean rating rounded to two decimals, 0 when there are no reviews.
    pub average: f64,
    pub count: i64,
}

/// Review statistics for a product page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewStats {
    pub total_reviews: i64,
    pub average_rating: f64,
    /// Keyed `"1_star"` through `"5_star"`; every key is always present.
    pub rating_distribution: BTreeMap<String, i64>,
    pub verified_reviews: i64,
}

impl ReviewStats {
    /// Build stats from the reviews and the product's stored average.
    pub fn new(reviews: &[ProductReview], average_rating: f64) -> Self {
        let rating_distribution = (MIN_RATING..=MAX_RATING)
            .map(|stars| {
                let n = reviews.iter().filter(|r| r.rating == stars).count() as i64;
                (format!("{}_star", stars), n)
            })
            .collect();

        Self {
            total_reviews: reviews.len() as i64,
            average_rating,
            rating_distribution,
            verified_reviews: reviews.iter().filter(|r| r.is_verified_purchase).count() as i64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{ProductId, UserId};

    #[test]
    fn test_stats_distribution() {
        let product = ProductId::new("p1");
        let mut reviews: Vec<ProductReview> = [5, 5, 3]
            .iter()
            .enumerate()
            .map(|(i, r)| {
                ProductReview::new(product.clone(), UserId::new(format!("u{}", i)), *r, "").unwrap()
            })
            .collect();
        reviews[0].is_verified_purchase = true;

        let stats = ReviewStats::new(&reviews, 4.33);
        assert_eq!(stats.total_reviews, 3);
        assert_eq!(stats.verified_reviews, 1);
        assert_eq!(stats.rating_distribution["5_star"], 2);
        assert_eq!(stats.rating_distribution["3_star"], 1);
        assert_eq!(stats.rating_distribution["1_star"], 0);
        assert_eq!(stats.rating_distribution.len(), 5);
    }
}
