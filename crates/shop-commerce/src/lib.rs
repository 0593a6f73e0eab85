//! Catalog, cart, search and review domain logic for the shop backend.
//!
//! This crate provides the types and services behind the shop's HTTP API:
//!
//! - **Catalog**: Products, categories, brands, images, attributes
//! - **Cart**: Cart ownership, item merging, enriched cart views
//! - **Search**: Typed filters, sorting, pagination, query-string parsing
//! - **Analytics**: View tracking and trending ranking
//! - **Reviews**: Reviews and rating aggregation
//!
//! Storage is abstracted behind the repository traits in [`store`]; the
//! services take them as `Arc<dyn ...>` so any backend can be plugged in.
//!
//! # Example
//!
//! ```rust,ignore
//! use shop_commerce::prelude::*;
//!
//! let carts = CartService::new(store.clone(), store.clone(), store.clone());
//! let resolved = carts.resolve(&CartIdentity::default()).await?;
//! carts.add_item(&resolved.cart, &product.id, 2).await?;
//!
//! let details = carts.details(&resolved.cart).await?;
//! println!("Subtotal: {}", details.subtotal()?.display());
//! ```

pub mod error;
pub mod ids;
pub mod money;
pub mod settings;
pub mod store;

pub mod analytics;
pub mod cart;
pub mod catalog;
pub mod reviews;
pub mod search;

pub use error::CommerceError;
pub use ids::*;
pub use money::{Currency, DecimalInput, Money};
pub use settings::CatalogSettings;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CommerceError;
    pub use crate::ids::*;
    pub use crate::money::{Currency, DecimalInput, Money};
    pub use crate::settings::CatalogSettings;

    // Storage
    pub use crate::store::{
        AnalyticsRepository, CartRepository, CatalogRepository, MediaRepository,
        ReviewRepository, StoreResult,
    };

    // Catalog
    pub use crate::catalog::{
        Brand, BulkUpdate, CatalogService, Category, NewBrand, NewCategory, NewProduct,
        Product, ProductAttribute, ProductImage, ProductPatch, ProductUpdate, StockStatus,
    };

    // Cart
    pub use crate::cart::{
        Cart, CartDetails, CartIdentity, CartItem, CartLine, CartOwner, CartService,
        ResolvedCart,
    };

    // Search
    pub use crate::search::{
        Pagination, ProductFilter, ProductQuery, QueryParams, SearchResults, SortOption,
    };

    // Analytics
    pub use crate::analytics::{AnalyticsService, ProductAnalytics, ProductView, TrendingProduct};

    // Reviews
    pub use crate::reviews::{
        NewReview, ProductReview, RatingSummary, ReviewEdit, ReviewService, ReviewStats,
    };
}

/// Current Unix time in seconds.
pub fn current_timestamp() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
