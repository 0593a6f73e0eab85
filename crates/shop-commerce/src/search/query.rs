//! Sort options and the product query.

use crate::search::ProductFilter;
use serde::{Deserialize, Serialize};

/// Sort options for product listings.
///
/// The store breaks ties by insertion order, so every ordering is stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SortOption {
    /// Sort by price, low to high.
    PriceAsc,
    /// Sort by price, high to low.
    PriceDesc,
    /// Sort by name A-Z.
    NameAsc,
    /// Sort by name Z-A.
    NameDesc,
    /// Sort by oldest first.
    Oldest,
    /// Sort by newest first.
    #[default]
    Newest,
    /// Sort by lowest rated.
    RatingAsc,
    /// Sort by highest rated.
    RatingDesc,
}

impl SortOption {
    /// Look up a `sort_by` key. Returns `None` for keys outside the allow-list.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "price" => Some(SortOption::PriceAsc),
            "-price" => Some(SortOption::PriceDesc),
            "name" => Some(SortOption::NameAsc),
            "-name" => Some(SortOption::NameDesc),
            "created_at" => Some(SortOption::Oldest),
            "-created_at" => Some(SortOption::Newest),
            "rating_average" => Some(SortOption::RatingAsc),
            "-rating_average" => Some(SortOption::RatingDesc),
            _ => None,
        }
    }

    /// Look up a key, falling back to the default order.
    pub fn from_key_or_default(key: Option<&str>) -> Self {
        key.and_then(Self::from_key).unwrap_or_default()
    }

    /// The `sort_by` key for this option.
    pub fn key(&self) -> &'static str {
        match self {
            SortOption::PriceAsc => "price",
            SortOption::PriceDesc => "-price",
            SortOption::NameAsc => "name",
            SortOption::NameDesc => "-name",
            SortOption::Oldest => "created_at",
            SortOption::Newest => "-created_at",
            SortOption::RatingAsc => "rating_average",
            SortOption::RatingDesc => "-rating_average",
        }
    }
}

/// A filtered, sorted, paginated product listing request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductQuery {
    /// Filter conditions.
    pub filter: ProductFilter,
    /// Sort option.
    pub sort: SortOption,
    /// Current page (1-indexed).
    pub page: i64,
    /// Items per page.
    pub page_size: i64,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductQuery {
    /// Create a query for the first page of active products, newest first.
    pub fn new() -> Self {
        Self {
            filter: ProductFilter::default(),
            sort: SortOption::default(),
            page: 1,
            page_size: 20,
        }
    }

    /// Set the filter.
    pub fn with_filter(mut self, filter: ProductFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Set sort option.
    pub fn with_sort(mut self, sort: SortOption) -> Self {
        self.sort = sort;
        self
    }

    /// Set pagination. Page is at least 1 and page size is clamped to
    /// `1..=max_page_size`.
    pub fn with_pagination(mut self, page: i64, page_size: i64, max_page_size: i64) -> Self {
        self.page = page.max(1);
        self.page_size = page_size.clamp(1, max_page_size.max(1));
        self
    }

    /// Offset of the first item on the current page.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}
