//! Product type and its derived inventory/pricing fields.

use crate::catalog::slug::{is_valid_slug, slugify};
use crate::current_timestamp;
use crate::error::CommerceError;
use crate::ids::{BrandId, CategoryId, ProductId};
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// Stock at or below this level (but above zero) is reported as limited.
pub const LIMITED_STOCK_THRESHOLD: i64 = 10;

/// Derived inventory indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LimitedStock,
    OutOfStock,
}

impl StockStatus {
    /// Classify a stock level.
    pub fn from_stock(stock: i64) -> Self {
        if stock <= 0 {
            StockStatus::OutOfStock
        } else if stock <= LIMITED_STOCK_THRESHOLD {
            StockStatus::LimitedStock
        } else {
            StockStatus::InStock
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::InStock => "in_stock",
            StockStatus::LimitedStock => "limited_stock",
            StockStatus::OutOfStock => "out_of_stock",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "in_stock" => Some(StockStatus::InStock),
            "limited_stock" => Some(StockStatus::LimitedStock),
            "out_of_stock" => Some(StockStatus::OutOfStock),
            _ => None,
        }
    }

    /// Inclusive stock bounds that classify as this status.
    pub fn stock_range(&self) -> (Option<i64>, Option<i64>) {
        match self {
            StockStatus::OutOfStock => (None, Some(0)),
            StockStatus::LimitedStock => (Some(1), Some(LIMITED_STOCK_THRESHOLD)),
            StockStatus::InStock => (Some(LIMITED_STOCK_THRESHOLD + 1), None),
        }
    }
}

/// A product in the catalog.
///
/// `price`, `original_price` and `stock` are only changed through setters
/// (or [`Product::apply`]), which recompute `stock_status` and
/// `discount_percentage`.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Unique product identifier.
    pub id: ProductId,
    /// Product name.
    pub name: String,
    /// URL-friendly slug (unique).
    pub slug: String,
    /// Full description.
    pub description: String,
    /// Short description for listings.
    pub short_description: String,
    price: Money,
    original_price: Option<Money>,
    discount_percentage: f64,
    /// Owning category.
    pub category_id: CategoryId,
    /// Optional brand.
    pub brand_id: Option<BrandId>,
    stock: i64,
    stock_status: StockStatus,
    /// Stock keeping unit (unique).
    pub sku: String,
    pub meta_title: String,
    pub meta_description: String,
    /// Inactive products are hidden from every storefront listing.
    pub is_active: bool,
    pub is_featured: bool,
    /// Set externally; trending ranking only considers flagged products.
    pub is_trending: bool,
    pub view_count: i64,
    pub purchase_count: i64,
    /// Mean review rating, two decimals.
    pub rating_average: f64,
    pub rating_count: i64,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Unix timestamp of last update.
    pub updated_at: i64,
}

impl Product {
    /// Create a new active product.
    pub fn new(
        name: impl Into<String>,
        sku: impl Into<String>,
        price: Money,
        category_id: CategoryId,
    ) -> Self {
        let name = name.into();
        let now = current_timestamp();
        let mut product = Self {
            id: ProductId::generate(),
            slug: slugify(&name),
            name,
            description: String::new(),
            short_description: String::new(),
            price,
            original_price: None,
            discount_percentage: 0.0,
            category_id,
            brand_id: None,
            stock: 0,
            stock_status: StockStatus::OutOfStock,
            sku: sku.into(),
            meta_title: String::new(),
            meta_description: String::new(),
            is_active: true,
            is_featured: false,
            is_trending: false,
            view_count: 0,
            purchase_count: 0,
            rating_average: 0.0,
            rating_count: 0,
            created_at: now,
            updated_at: now,
        };
        product.refresh_derived();
        product
    }

    /// Selling price.
    pub fn price(&self) -> Money {
        self.price
    }

    /// Price before discount, shown struck through.
    pub fn original_price(&self) -> Option<Money> {
        self.original_price
    }

    /// Units on hand (never negative).
    pub fn stock(&self) -> i64 {
        self.stock
    }

    /// Derived inventory indicator.
    pub fn stock_status(&self) -> StockStatus {
        self.stock_status
    }

    /// Percentage saved against `original_price`, two decimals.
    pub fn discount_percentage(&self) -> f64 {
        self.discount_percentage
    }

    /// Check if the product is on sale.
    pub fn is_on_sale(&self) -> bool {
        self.original_price
            .map(|op| op.amount_cents > self.price.amount_cents)
            .unwrap_or(false)
    }

    /// Amount saved against `original_price`, or zero.
    pub fn discount_amount(&self) -> Money {
        match self.original_price {
            Some(op) if op.amount_cents > self.price.amount_cents => {
                Money::new(op.amount_cents - self.price.amount_cents, self.price.currency)
            }
            _ => Money::zero(self.price.currency),
        }
    }

    /// Set the stock level.
    pub fn set_stock(&mut self, stock: i64) -> Result<(), CommerceError> {
        if stock < 0 {
            return Err(CommerceError::validation("stock cannot be negative"));
        }
        self.stock = stock;
        self.save();
        Ok(())
    }

    /// Set the selling price.
    pub fn set_price(&mut self, price: Money) -> Result<(), CommerceError> {
        if price.is_negative() {
            return Err(CommerceError::validation("price cannot be negative"));
        }
        self.price = price;
        self.save();
        Ok(())
    }

    /// Set or clear the pre-discount price.
    pub fn set_original_price(&mut self, original: Option<Money>) -> Result<(), CommerceError> {
        if original.is_some_and(|op| op.is_negative()) {
            return Err(CommerceError::validation("original_price cannot be negative"));
        }
        self.original_price = original;
        self.save();
        Ok(())
    }

    /// Apply a patch, validating it first. Nothing changes on error.
    pub fn apply(&mut self, patch: &ProductPatch) -> Result<(), CommerceError> {
        patch.validate()?;

        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(slug) = &patch.slug {
            self.slug = slug.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(short) = &patch.short_description {
            self.short_description = short.clone();
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(original_price) = patch.original_price {
            self.original_price = original_price;
        }
        if let Some(category_id) = &patch.category_id {
            self.category_id = category_id.clone();
        }
        if let Some(brand_id) = &patch.brand_id {
            self.brand_id = brand_id.clone();
        }
        if let Some(stock) = patch.stock {
            self.stock = stock;
        }
        if let Some(sku) = &patch.sku {
            self.sku = sku.clone();
        }
        if let Some(meta_title) = &patch.meta_title {
            self.meta_title = meta_title.clone();
        }
        if let Some(meta_description) = &patch.meta_description {
            self.meta_description = meta_description.clone();
        }
        if let Some(v) = patch.is_active {
            self.is_active = v;
        }
        if let Some(v) = patch.is_featured {
            self.is_featured = v;
        }
        if let Some(v) = patch.is_trending {
            self.is_trending = v;
        }

        self.save();
        Ok(())
    }

    /// Recompute derived fields and bump `updated_at`.
    pub fn save(&mut self) {
        self.refresh_derived();
        self.updated_at = current_timestamp();
    }

    fn refresh_derived(&mut self) {
        self.stock_status = StockStatus::from_stock(self.stock);
        self.discount_percentage = match self.original_price {
            Some(op) if op.amount_cents > self.price.amount_cents && op.amount_cents > 0 => {
                let savings = (op.amount_cents - self.price.amount_cents) as f64;
                round2(savings / op.amount_cents as f64 * 100.0)
            }
            _ => 0.0,
        };
    }
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A partial update to a product. `None` leaves a field untouched.
///
/// The doubly-optional fields distinguish "leave alone" (`None`) from
/// "clear" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub price: Option<Money>,
    pub original_price: Option<Option<Money>>,
    pub category_id: Option<CategoryId>,
    pub brand_id: Option<Option<BrandId>>,
    pub stock: Option<i64>,
    pub sku: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub is_trending: Option<bool>,
}

impl ProductPatch {
    /// Check field-level constraints.
    pub fn validate(&self) -> Result<(), CommerceError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(CommerceError::validation("name cannot be empty"));
            }
        }
        if let Some(slug) = &self.slug {
            if !is_valid_slug(slug) {
                return Err(CommerceError::validation(format!("invalid slug: {}", slug)));
            }
        }
        if let Some(sku) = &self.sku {
            if sku.trim().is_empty() {
                return Err(CommerceError::validation("sku cannot be empty"));
            }
        }
        if let Some(stock) = self.stock {
            if stock < 0 {
                return Err(CommerceError::validation("stock cannot be negative"));
            }
        }
        if let Some(price) = self.price {
            if price.is_negative() {
                return Err(CommerceError::validation("price cannot be negative"));
            }
        }
        if let Some(Some(original_price)) = self.original_price {
            if original_price.is_negative() {
                return Err(CommerceError::validation("original_price cannot be negative"));
            }
        }
        Ok(())
    }

    /// Check whether the patch changes anything.
    pub fn is_empty(&self) -> bool {
        *self == ProductPatch::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;

    fn usd(cents: i64) -> Money {
        Money::new(cents, Currency::USD)
    }

    fn product() -> Product {
        Product::new("Test Product", "SKU-001", usd(2000), CategoryId::new("cat-1"))
    }

    #[test]
    fn test_product_creation() {
        let p = product();
        assert_eq!(p.slug, "test-product");
        assert!(p.is_active);
        assert_eq!(p.stock_status(), StockStatus::OutOfStock);
        assert_eq!(p.discount_percentage(), 0.0);
    }

    #[test]
    fn test_stock_status_transitions() {
        let mut p = product();
        p.set_stock(0).unwrap();
        assert_eq!(p.stock_status(), StockStatus::OutOfStock);
        p.set_stock(5).unwrap();
        assert_eq!(p.stock_status(), StockStatus::LimitedStock);
        p.set_stock(10).unwrap();
        assert_eq!(p.stock_status(), StockStatus::LimitedStock);
        p.set_stock(11).unwrap();
        assert_eq!(p.stock_status(), StockStatus::InStock);
        p.set_stock(50).unwrap();
        assert_eq!(p.stock_status(), StockStatus::InStock);
        p.set_stock(0).unwrap();
        assert_eq!(p.stock_status(), StockStatus::OutOfStock);
    }

    #[test]
    fn test_negative_stock_rejected() {
        let mut p = product();
        p.set_stock(3).unwrap();
        assert!(p.set_stock(-1).is_err());
        assert_eq!(p.stock(), 3);
    }

    #[test]
    fn test_price_setters_recompute_discount() {
        let mut p = product();
        p.set_original_price(Some(usd(4000))).unwrap();
        assert_eq!(p.discount_percentage(), 50.0);

        p.set_price(usd(1000)).unwrap();
        assert_eq!(p.discount_percentage(), 75.0);

        assert!(p.set_price(usd(-1)).is_err());
        assert!(p.set_original_price(Some(usd(-1))).is_err());
        assert_eq!(p.price().amount_cents, 1000);

        p.set_original_price(None).unwrap();
        assert!(!p.is_on_sale());
        assert_eq!(p.discount_percentage(), 0.0);
    }

    #[test]
    fn test_stock_range_agrees_with_classification() {
        for status in [StockStatus::OutOfStock, StockStatus::LimitedStock, StockStatus::InStock] {
            let (min, max) = status.stock_range();
            for stock in [0, 1, 10, 11, 500] {
                let inside = min.map_or(true, |m| stock >= m) && max.map_or(true, |m| stock <= m);
                assert_eq!(inside, StockStatus::from_stock(stock) == status, "{stock}");
            }
        }
    }

    #[test]
    fn test_discount_recomputed_on_every_patch() {
        let mut p = product();
        p.apply(&ProductPatch {
            original_price: Some(Some(usd(3000))),
            ..Default::default()
        })
        .unwrap();
        assert!(p.is_on_sale());
        assert_eq!(p.discount_percentage(), 33.33);
        assert_eq!(p.discount_amount().amount_cents, 1000);

        // Raising the price above the original clears the discount.
        p.apply(&ProductPatch {
            price: Some(usd(3500)),
            ..Default::default()
        })
        .unwrap();
        assert!(!p.is_on_sale());
        assert_eq!(p.discount_percentage(), 0.0);
        assert_eq!(p.discount_amount().amount_cents, 0);
    }

    #[test]
    fn test_patch_validation_leaves_product_untouched() {
        let mut p = product();
        let result = p.apply(&ProductPatch {
            name: Some("Renamed".into()),
            stock: Some(-5),
            ..Default::default()
        });
        assert!(result.is_err());
        assert_eq!(p.name, "Test Product");
    }

    #[test]
    fn test_patch_rejects_unslugged_slug() {
        let patch = ProductPatch {
            slug: Some("Not A Slug".into()),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn test_stock_status_parse() {
        assert_eq!(StockStatus::parse("limited_stock"), Some(StockStatus::LimitedStock));
        assert_eq!(StockStatus::parse("IN_STOCK"), Some(StockStatus::InStock));
        assert_eq!(StockStatus::parse("plenty"), None);
        assert_eq!(StockStatus::OutOfStock.as_str(), "out_of_stock");
    }
}
