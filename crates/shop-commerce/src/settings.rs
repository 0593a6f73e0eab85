//! Tunables for catalog listings and trending.

use serde::{Deserialize, Serialize};

/// Catalog behavior knobs, usually loaded from the `[catalog]` config table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogSettings {
    /// Default upper stock bound for the low-stock listing.
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: i64,

    /// Length of the trailing window counted for trending, in days.
    #[serde(default = "default_trending_window_days")]
    pub trending_window_days: i64,

    /// Maximum number of trending products returned.
    #[serde(default = "default_trending_limit")]
    pub trending_limit: usize,

    /// Page size when the request doesn't give one.
    #[serde(default = "default_page_size")]
    pub default_page_size: i64,

    /// Largest page size a request may ask for.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: i64,
}

fn default_low_stock_threshold() -> i64 {
    10
}

fn default_trending_window_days() -> i64 {
    30
}

fn default_trending_limit() -> usize {
    20
}

fn default_page_size() -> i64 {
    20
}

fn default_max_page_size() -> i64 {
    100
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            low_stock_threshold: default_low_stock_threshold(),
            trending_window_days: default_trending_window_days(),
            trending_limit: default_trending_limit(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl CatalogSettings {
    /// Trending window in seconds.
    pub fn trending_window_secs(&self) -> i64 {
        self.trending_window_days.saturating_mul(24 * 60 * 60)
    }
}
