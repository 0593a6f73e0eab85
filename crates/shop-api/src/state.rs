//! Shared handler state.

use shop_commerce::prelude::*;
use std::sync::Arc;

/// The services every handler can reach. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub carts: CartService,
    pub reviews: ReviewService,
    pub analytics: AnalyticsService,
}

impl AppState {
    /// Build every service over one store that implements all repositories.
    pub fn from_store<S>(store: Arc<S>, settings: CatalogSettings) -> Self
    where
        S: CatalogRepository
            + MediaRepository
            + CartRepository
            + ReviewRepository
            + AnalyticsRepository
            + 'static,
    {
        Self {
            catalog: CatalogService::new(store.clone(), store.clone(), settings.clone()),
            carts: CartService::new(store.clone(), store.clone(), store.clone()),
            reviews: ReviewService::new(store.clone(), store.clone()),
            analytics: AnalyticsService::new(store.clone(), store, settings),
        }
    }

    pub fn settings(&self) -> &CatalogSettings {
        self.catalog.settings()
    }
}
