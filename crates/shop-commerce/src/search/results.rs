//! Search results and pagination.

use serde::{Deserialize, Serialize};

/// Pagination info.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    /// Current page (1-indexed).
    pub page: i64,
    /// Items per page.
    pub page_size: i64,
    /// Total number of matching items.
    pub count: i64,
    /// Total number of pages (at least 1).
    pub total_pages: i64,
    /// Whether there's a next page.
    pub has_next: bool,
    /// Whether there's a previous page.
    pub has_previous: bool,
}

impl Pagination {
    /// Create pagination info.
    pub fn new(page: i64, page_size: i64, count: i64) -> Self {
        let page_size = page_size.max(1);
        let total_pages = if count == 0 {
            1
        } else {
            (count + page_size - 1) / page_size
        };

        Self {
            page,
            page_size,
            count,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }

    /// Get the offset of the first item on this page.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, 20, 0)
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults<T> {
    /// The result items on this page.
    pub items: Vec<T>,
    /// Pagination info.
    pub pagination: Pagination,
}

impl<T> SearchResults<T> {
    /// Create new search results.
    pub fn new(items: Vec<T>, pagination: Pagination) -> Self {
        Self { items, pagination }
    }

    /// Create empty results.
    pub fn empty(page_size: i64) -> Self {
        Self {
            items: Vec::new(),
            pagination: Pagination::new(1, page_size, 0),
        }
    }

    /// Convert each item, keeping the pagination.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> SearchResults<U> {
        SearchResults {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get number of items in this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }
}
