//! HTTP JSON API for the shop backend.
//!
//! Builds an axum [`Router`] over the domain services in `shop_commerce`.
//! Everything is served under `/api`; cross-cutting layers (tracing,
//! timeouts, request ids) are added by the server binary.
//!
//! # Example
//!
//! ```rust,ignore
//! let db = Arc::new(Db::connect("sqlite://shop.db").await?);
//! let state = AppState::from_store(db, CatalogSettings::default());
//! let app = shop_api::app(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod error;
pub mod identity;
mod routes;
pub mod state;
pub mod views;

pub use axum;
pub use error::{ApiError, ApiResult};
pub use identity::RequestIdentity;
pub use state::AppState;

use axum::Router;

/// The full API router with state applied.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .nest("/health", routes::health::routes())
        .nest("/cart", routes::cart::routes())
        .nest("/products", routes::products::routes())
        .nest("/reviews", routes::reviews::routes())
        .nest("/brands", routes::catalog::brand_routes())
        .nest("/categories", routes::catalog::category_routes())
        .with_state(state);

    Router::new().nest("/api", api)
}
