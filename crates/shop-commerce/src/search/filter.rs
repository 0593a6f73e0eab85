//! Typed product filter.

use crate::catalog::StockStatus;
use crate::ids::{BrandId, CategoryId};
use crate::money::Money;

/// Conditions a product must satisfy to appear in a listing.
///
/// Every populated field must hold (AND). Within a multi-valued field any
/// value may match, and free text matches if any searchable field contains it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    /// Also consider inactive products. Storefront listings leave this off.
    pub include_inactive: bool,
    pub category_ids: Vec<CategoryId>,
    pub brand_ids: Vec<BrandId>,
    /// Inclusive lower price bound.
    pub min_price: Option<Money>,
    /// Inclusive upper price bound.
    pub max_price: Option<Money>,
    pub stock_status: Option<StockStatus>,
    pub min_rating: Option<f64>,
    pub on_sale: bool,
    pub featured: bool,
    pub trending: bool,
    /// Case-insensitive substring across name, descriptions, category name
    /// and brand name.
    pub text: Option<String>,
    /// Exact SKU matches.
    pub skus: Vec<String>,
    /// Inclusive stock bounds.
    pub min_stock: Option<i64>,
    pub max_stock: Option<i64>,
}

impl ProductFilter {
    /// Filter over active products only.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, id: impl Into<CategoryId>) -> Self {
        self.category_ids.push(id.into());
        self
    }

    pub fn brand(mut self, id: impl Into<BrandId>) -> Self {
        self.brand_ids.push(id.into());
        self
    }

    pub fn price_range(mut self, min: Option<Money>, max: Option<Money>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn stock_status(mut self, status: StockStatus) -> Self {
        self.stock_status = Some(status);
        self
    }

    pub fn min_rating(mut self, rating: f64) -> Self {
        self.min_rating = Some(rating);
        self
    }

    pub fn on_sale(mut self) -> Self {
        self.on_sale = true;
        self
    }

    pub fn featured(mut self) -> Self {
        self.featured = true;
        self
    }

    pub fn trending(mut self) -> Self {
        self.trending = true;
        self
    }

    /// Set the free-text term. Blank terms are ignored.
    pub fn text(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        let query = query.trim();
        self.text = if query.is_empty() {
            None
        } else {
            Some(query.to_string())
        };
        self
    }

    pub fn skus(mut self, skus: Vec<String>) -> Self {
        self.skus = skus;
        self
    }

    pub fn stock_range(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.min_stock = min;
        self.max_stock = max;
        self
    }

    pub fn include_inactive(mut self) -> Self {
        self.include_inactive = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;

    #[test]
    fn test_default_filter_is_storefront_scope() {
        let f = ProductFilter::new();
        assert!(!f.include_inactive);
        assert!(f.category_ids.is_empty());
        assert!(ProductFilter::new().include_inactive().include_inactive);
    }

    #[test]
    fn test_builders_accumulate() {
        let f = ProductFilter::new()
            .category("c9")
            .category("c1")
            .brand("b1")
            .price_range(Some(Money::new(100, Currency::USD)), None)
            .featured()
            .on_sale();
        assert_eq!(f.category_ids, vec![CategoryId::new("c9"), CategoryId::new("c1")]);
        assert_eq!(f.brand_ids, vec![BrandId::new("b1")]);
        assert_eq!(f.min_price.map(|m| m.amount_cents), Some(100));
        assert_eq!(f.max_price, None);
        assert!(f.featured && f.on_sale && !f.trending);
    }

    #[test]
    fn test_text_is_trimmed() {
        assert_eq!(ProductFilter::new().text("  lamp ").text.as_deref(), Some("lamp"));
    }

    #[test]
    fn test_blank_text_is_ignored() {
        let f = ProductFilter::new().text("   ");
        assert_eq!(f.text, None);
    }
}
