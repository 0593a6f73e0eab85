//! Search module.
//!
//! Contains the typed product filter, sort options, pagination, and the
//! parsing of listing query strings.

mod filter;
mod params;
mod query;
mod results;
mod sku;

pub use filter::ProductFilter;
pub use params::QueryParams;
pub use query::{ProductQuery, SortOption};
pub use results::{Pagination, SearchResults};
pub use sku::{normalize_sku, normalize_skus};
