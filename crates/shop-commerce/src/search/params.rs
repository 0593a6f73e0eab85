//! Building a [`ProductQuery`] from URL query pairs.

use crate::catalog::StockStatus;
use crate::error::CommerceError;
use crate::money::{Currency, Money};
use crate::search::{ProductFilter, ProductQuery, SortOption};
use crate::settings::CatalogSettings;

/// Raw query-string pairs in arrival order. Keys may repeat.
pub struct QueryParams<'a> {
    pairs: &'a [(String, String)],
}

impl<'a> QueryParams<'a> {
    pub fn new(pairs: &'a [(String, String)]) -> Self {
        Self { pairs }
    }

    /// First non-empty value for `key`.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.trim())
            .find(|v| !v.is_empty())
    }

    /// All values for `key`, with comma-separated values split out.
    pub fn get_all(&self, key: &str) -> Vec<&'a str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .flat_map(|(_, v)| v.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect()
    }

    /// Parse `key` as an integer, if present.
    pub fn get_i64(&self, key: &str) -> Result<Option<i64>, CommerceError> {
        self.get(key)
            .map(|v| {
                v.parse::<i64>()
                    .map_err(|_| CommerceError::validation(format!("{} must be an integer, got {:?}", key, v)))
            })
            .transpose()
    }

    /// Parse `key` as a decimal price, if present.
    pub fn get_money(&self, key: &str, currency: Currency) -> Result<Option<Money>, CommerceError> {
        self.get(key)
            .map(|v| {
                Money::parse(v, currency)
                    .ok_or_else(|| CommerceError::validation(format!("{} must be a decimal amount, got {:?}", key, v)))
            })
            .transpose()
    }

    /// Parse `key` as a float, if present.
    pub fn get_f64(&self, key: &str) -> Result<Option<f64>, CommerceError> {
        self.get(key)
            .map(|v| match v.parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(f),
                _ => Err(CommerceError::validation(format!("{} must be a number, got {:?}", key, v))),
            })
            .transpose()
    }

    /// `true`, `1` and `yes` (any case) are true; anything else is false.
    pub fn get_flag(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false)
    }

    /// Page number and clamped page size.
    pub fn page(&self, settings: &CatalogSettings) -> Result<(i64, i64), CommerceError> {
        let page = self.get_i64("page")?.unwrap_or(1).max(1);
        let page_size = self
            .get_i64("page_size")?
            .unwrap_or(settings.default_page_size)
            .clamp(1, settings.max_page_size.max(1));
        Ok((page, page_size))
    }

    /// The `sort_by` option. Keys outside the allow-list use the default.
    pub fn sort(&self) -> SortOption {
        SortOption::from_key_or_default(self.get("sort_by"))
    }

    /// Build the full product query from the listing parameters.
    ///
    /// Understands `category`/`categories`, `brand`/`brands`, `min_price`,
    /// `max_price`, `stock_status`, `min_rating`, `on_sale`, `featured`,
    /// `q`/`search`, `sort_by`, `page` and `page_size`.
    pub fn product_query(&self, settings: &CatalogSettings) -> Result<ProductQuery, CommerceError> {
        let mut filter = ProductFilter::new();

        for id in self.get_all("category").into_iter().chain(self.get_all("categories")) {
            filter = filter.category(id);
        }
        for id in self.get_all("brand").into_iter().chain(self.get_all("brands")) {
            filter = filter.brand(id);
        }

        filter = filter.price_range(
            self.get_money("min_price", Currency::USD)?,
            self.get_money("max_price", Currency::USD)?,
        );

        if let Some(raw) = self.get("stock_status") {
            let status = StockStatus::parse(raw).ok_or_else(|| {
                CommerceError::validation(format!(
                    "stock_status must be one of in_stock, limited_stock, out_of_stock; got {:?}",
                    raw
                ))
            })?;
            filter = filter.stock_status(status);
        }

        if let Some(rating) = self.get_f64("min_rating")? {
            filter = filter.min_rating(rating);
        }
        if self.get_flag("on_sale") {
            filter = filter.on_sale();
        }
        if self.get_flag("featured") {
            filter = filter.featured();
        }
        if let Some(text) = self.get("q").or_else(|| self.get("search")) {
            filter = filter.text(text);
        }

        let (page, page_size) = self.page(settings)?;

        Ok(ProductQuery::new()
            .with_filter(filter)
            .with_sort(self.sort())
            .with_pagination(page, page_size, settings.max_page_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{BrandId, CategoryId};

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_multi_value_params() {
        let raw = pairs(&[("categories", "a,b"), ("categories", "c"), ("brand", "x")]);
        let query = QueryParams::new(&raw).product_query(&CatalogSettings::default()).unwrap();
        assert_eq!(
            query.filter.category_ids,
            vec![CategoryId::new("a"), CategoryId::new("b"), CategoryId::new("c")]
        );
        assert_eq!(query.filter.brand_ids, vec![BrandId::new("x")]);
    }

    #[test]
    fn test_price_and_rating() {
        let raw = pairs(&[("min_price", "10"), ("max_price", "99.99"), ("min_rating", "4")]);
        let query = QueryParams::new(&raw).product_query(&CatalogSettings::default()).unwrap();
        assert_eq!(query.filter.min_price.map(|m| m.amount_cents), Some(1000));
        assert_eq!(query.filter.max_price.map(|m| m.amount_cents), Some(9999));
        assert_eq!(query.filter.min_rating, Some(4.0));
    }

    #[test]
    fn test_malformed_numbers_rejected() {
        let settings = CatalogSettings::default();
        for (key, value) in [("min_price", "abc"), ("max_price", "1.2.3"), ("min_rating", "high"), ("page", "two")] {
            let raw = pairs(&[(key, value)]);
            let err = QueryParams::new(&raw).product_query(&settings).unwrap_err();
            assert!(err.is_validation(), "{} should be rejected", key);
        }
    }

    #[test]
    fn test_unknown_stock_status_rejected() {
        let raw = pairs(&[("stock_status", "plenty")]);
        assert!(QueryParams::new(&raw)
            .product_query(&CatalogSettings::default())
            .is_err());
    }

    #[test]
    fn test_empty_values_ignored() {
        let raw = pairs(&[("min_price", ""), ("category", ""), ("stock_status", " ")]);
        let query = QueryParams::new(&raw).product_query(&CatalogSettings::default()).unwrap();
        assert_eq!(query.filter, ProductFilter::new());
    }

    #[test]
    fn test_flags_and_text() {
        let raw = pairs(&[("on_sale", "true"), ("featured", "no"), ("search", "lamp")]);
        let query = QueryParams::new(&raw).product_query(&CatalogSettings::default()).unwrap();
        assert!(query.filter.on_sale);
        assert!(!query.filter.featured);
        assert_eq!(query.filter.text.as_deref(), Some("lamp"));
    }

    #[test]
    fn test_sort_and_page() {
        let raw = pairs(&[("sort_by", "-price"), ("page", "3"), ("page_size", "1000")]);
        let query = QueryParams::new(&raw).product_query(&CatalogSettings::default()).unwrap();
        assert_eq!(query.sort, SortOption::PriceDesc);
        assert_eq!(query.page, 3);
        assert_eq!(query.page_size, 100);

        let raw = pairs(&[("sort_by", "popularity")]);
        let query = QueryParams::new(&raw).product_query(&CatalogSettings::default()).unwrap();
        assert_eq!(query.sort, SortOption::Newest);
        assert_eq!(query.page_size, 20);

        let raw = pairs(&[("sort_by", "name")]);
        assert_eq!(QueryParams::new(&raw).sort(), SortOption::NameAsc);
    }
}
