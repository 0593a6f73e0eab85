//! View tracking and trending.

use crate::analytics::{rank_trending, ProductAnalytics, ProductView, TrendingProduct};
use crate::current_timestamp;
use crate::error::CommerceError;
use crate::ids::{ProductId, UserId};
use crate::search::{ProductFilter, SortOption};
use crate::settings::CatalogSettings;
use crate::store::{AnalyticsRepository, CatalogRepository, StoreResult};
use std::sync::Arc;
use tracing::debug;

/// Analytics operations.
#[derive(Clone)]
pub struct AnalyticsService {
    catalog: Arc<dyn CatalogRepository>,
    analytics: Arc<dyn AnalyticsRepository>,
    settings: CatalogSettings,
}

impl AnalyticsService {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        analytics: Arc<dyn AnalyticsRepository>,
        settings: CatalogSettings,
    ) -> Self {
        Self {
            catalog,
            analytics,
            settings,
        }
    }

    /// Record a view of a product. Returns whether this viewer is new.
    pub async fn record_view(
        &self,
        product_id: &ProductId,
        user_id: Option<&UserId>,
        ip_address: Option<&str>,
    ) -> StoreResult<bool> {
        if self.catalog.get_product(product_id).await?.is_none() {
            return Err(CommerceError::ProductNotFound(product_id.to_string()));
        }
        let view = ProductView::new(product_id.clone(), user_id.cloned(), ip_address);
        let inserted = self.analytics.record_view(view).await?;
        debug!(product_id = %product_id, inserted, "product view recorded");
        Ok(inserted)
    }

    /// Trending products as of now.
    pub async fn trending(&self) -> StoreResult<Vec<TrendingProduct>> {
        self.trending_at(current_timestamp()).await
    }

    /// Trending products counting views in the window ending at `now`.
    pub async fn trending_at(&self, now: i64) -> StoreResult<Vec<TrendingProduct>> {
        let candidates = self
            .catalog
            .select_products(&ProductFilter::new().trending(), SortOption::default())
            .await?;
        let since = now.saturating_sub(self.settings.trending_window_secs());
        let recent = self.analytics.view_counts_since(since).await?;
        Ok(rank_trending(candidates, &recent, self.settings.trending_limit))
    }

    /// Analytics for one product, active or not.
    pub async fn product_analytics(&self, product_id: &ProductId) -> StoreResult<ProductAnalytics> {
        self.product_analytics_at(product_id, current_timestamp()).await
    }

    pub async fn product_analytics_at(
        &self,
        product_id: &ProductId,
        now: i64,
    ) -> StoreResult<ProductAnalytics> {
        let product = self
            .catalog
            .get_product(product_id)
            .await?
            .ok_or_else(|| CommerceError::ProductNotFound(product_id.to_string()))?;
        let since = now.saturating_sub(self.settings.trending_window_secs());
        let recent = self.analytics.product_views_since(product_id, since).await?;
        Ok(ProductAnalytics::new(&product, recent))
    }
}
