//! Trending ranking.

use crate::catalog::{Product, StockStatus};
use crate::ids::ProductId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// A product with its view count inside the trending window.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendingProduct {
    pub product: Product,
    pub recent_views: i64,
}

/// Rank trending candidates.
///
/// Only products flagged `is_trending` and active are considered. Order is
/// recent views, then rating, then purchases, all descending; ties keep the
/// input order. At most `limit` products are returned.
pub fn rank_trending(
    candidates: Vec<Product>,
    recent_views: &HashMap<ProductId, i64>,
    limit: usize,
) -> Vec<TrendingProduct> {
    let mut ranked: Vec<TrendingProduct> = candidates
        .into_iter()
        .filter(|p| p.is_trending && p.is_active)
        .map(|product| {
            let recent_views = recent_views.get(&product.id).copied().unwrap_or(0);
            TrendingProduct {
                product,
                recent_views,
            }
        })
        .collect();

    ranked.sort_by(compare);
    ranked.truncate(limit);
    ranked
}

fn compare(a: &TrendingProduct, b: &TrendingProduct) -> Ordering {
    b.recent_views
        .cmp(&a.recent_views)
        .then_with(|| b.product.rating_average.total_cmp(&a.product.rating_average))
        .then_with(|| b.product.purchase_count.cmp(&a.product.purchase_count))
}

/// Per-product analytics snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductAnalytics {
    pub total_views: i64,
    pub recent_views: i64,
    pub purchase_count: i64,
    pub rating_average: f64,
    pub rating_count: i64,
    pub stock_level: i64,
    pub stock_status: StockStatus,
    pub is_trending: bool,
    pub is_featured: bool,
}

impl ProductAnalytics {
    pub fn new(product: &Product, recent_views: i64) -> Self {
        Self {
            total_views: product.view_count,
            recent_views,
            purchase_count: product.purchase_count,
            rating_average: product.rating_average,
            rating_count: product.rating_count,
            stock_level: product.stock(),
            stock_status: product.stock_status(),
            is_trending: product.is_trending,
            is_featured: product.is_featured,
        }
    }
}
