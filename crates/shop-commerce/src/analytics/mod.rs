//! Analytics module.
//!
//! Product view tracking, trending ranking and per-product analytics.

mod service;
mod trending;
mod view;

pub use service::AnalyticsService;
pub use trending::{rank_trending, ProductAnalytics, TrendingProduct};
pub use view::{ProductView, DEFAULT_CLIENT_IP};
