//! Catalog service: product, category, brand, image and attribute operations.

use crate::catalog::slug::{is_valid_slug, slug_candidates};
use crate::catalog::{
    Brand, Category, Product, ProductAttribute, ProductImage, ProductPatch,
};
use crate::error::CommerceError;
use crate::ids::{AttributeId, BrandId, CategoryId, ImageId, ProductId};
use crate::money::{Currency, DecimalInput, Money};
use crate::search::{normalize_skus, ProductFilter, ProductQuery, SearchResults, SortOption};
use crate::settings::CatalogSettings;
use crate::store::{CatalogRepository, MediaRepository, StoreResult};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Fields for creating a product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    /// Derived from the name when absent.
    #[serde(default)]
    pub slug: Option<String>,
    pub sku: String,
    pub price: DecimalInput,
    #[serde(default)]
    pub original_price: Option<DecimalInput>,
    #[serde(alias = "category")]
    pub category_id: CategoryId,
    #[serde(default, alias = "brand")]
    pub brand_id: Option<BrandId>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub meta_title: String,
    #[serde(default)]
    pub meta_description: String,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_trending: bool,
}

/// Fields for creating a category.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, alias = "parent")]
    pub parent_id: Option<CategoryId>,
}

/// Fields for creating a brand.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBrand {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub logo_url: Option<String>,
}

/// The fields a bulk update may touch. Unknown fields are rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BulkUpdate {
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub is_trending: Option<bool>,
    pub price: Option<DecimalInput>,
    /// `null` clears the original price.
    #[serde(default, deserialize_with = "double_option")]
    pub original_price: Option<Option<DecimalInput>>,
    pub stock: Option<i64>,
}

impl BulkUpdate {
    /// Convert to a product patch, parsing the prices.
    pub fn into_patch(self) -> Result<ProductPatch, CommerceError> {
        let price = self
            .price
            .map(|p| money_field("price", &p))
            .transpose()?;
        let original_price = match self.original_price {
            None => None,
            Some(None) => Some(None),
            Some(Some(p)) => Some(Some(money_field("original_price", &p)?)),
        };
        let patch = ProductPatch {
            is_active: self.is_active,
            is_featured: self.is_featured,
            is_trending: self.is_trending,
            price,
            original_price,
            stock: self.stock,
            ..Default::default()
        };
        patch.validate()?;
        Ok(patch)
    }
}

/// A partial product edit as sent by a client.
///
/// Derived and counter fields are not accepted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub price: Option<DecimalInput>,
    #[serde(default, deserialize_with = "double_option")]
    pub original_price: Option<Option<DecimalInput>>,
    #[serde(alias = "category")]
    pub category_id: Option<CategoryId>,
    #[serde(default, alias = "brand", deserialize_with = "double_option")]
    pub brand_id: Option<Option<BrandId>>,
    pub stock: Option<i64>,
    pub sku: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub is_trending: Option<bool>,
}

impl ProductUpdate {
    pub fn into_patch(self) -> Result<ProductPatch, CommerceError> {
        let price = self
            .price
            .map(|p| money_field("price", &p))
            .transpose()?;
        let original_price = match self.original_price {
            None => None,
            Some(None) => Some(None),
            Some(Some(p)) => Some(Some(money_field("original_price", &p)?)),
        };
        let patch = ProductPatch {
            name: self.name.map(|n| n.trim().to_string()),
            slug: self.slug,
            description: self.description,
            short_description: self.short_description,
            price,
            original_price,
            category_id: self.category_id,
            brand_id: self.brand_id,
            stock: self.stock,
            sku: self.sku.map(|s| s.trim().to_string()),
            meta_title: self.meta_title,
            meta_description: self.meta_description,
            is_active: self.is_active,
            is_featured: self.is_featured,
            is_trending: self.is_trending,
        };
        patch.validate()?;
        Ok(patch)
    }
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn money_field(field: &str, input: &DecimalInput) -> Result<Money, CommerceError> {
    input
        .to_money(Currency::USD)
        .ok_or_else(|| CommerceError::validation(format!("{} must be a decimal amount", field)))
}

/// Read a stock level from a request body value.
///
/// The value is required and must be a non-negative integer or a string
/// holding one.
pub fn parse_stock(value: Option<&serde_json::Value>) -> Result<i64, CommerceError> {
    use serde_json::Value;

    let stock = match value {
        None | Some(Value::Null) => return Err(CommerceError::validation("stock is required")),
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
    }
    .ok_or_else(|| CommerceError::validation("Invalid stock value"))?;

    if stock < 0 {
        return Err(CommerceError::validation("stock cannot be negative"));
    }
    Ok(stock)
}

#[derive(Debug, Clone, Copy)]
enum SlugScope {
    Product,
    Category,
    Brand,
}

/// Catalog operations over the product, media and taxonomy stores.
#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogRepository>,
    media: Arc<dyn MediaRepository>,
    settings: CatalogSettings,
}

impl CatalogService {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        media: Arc<dyn MediaRepository>,
        settings: CatalogSettings,
    ) -> Self {
        Self {
            catalog,
            media,
            settings,
        }
    }

    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    // ---- products ----

    /// Create a product. The slug is derived from the name when absent.
    pub async fn create_product(&self, input: NewProduct) -> StoreResult<Product> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(CommerceError::validation("name is required"));
        }
        let sku = input.sku.trim().to_string();
        if sku.is_empty() {
            return Err(CommerceError::validation("sku is required"));
        }
        let price = money_field("price", &input.price)?;
        let original_price = input
            .original_price
            .as_ref()
            .map(|p| money_field("original_price", p))
            .transpose()?;

        self.check_category(&input.category_id).await?;
        if let Some(brand_id) = &input.brand_id {
            self.check_brand(brand_id).await?;
        }

        let slug = self.resolve_slug(SlugScope::Product, &name, input.slug).await?;

        let mut product = Product::new(name, sku, price, input.category_id);
        product.apply(&ProductPatch {
            slug: Some(slug),
            price: Some(price),
            description: Some(input.description),
            short_description: Some(input.short_description),
            original_price: Some(original_price),
            brand_id: Some(input.brand_id),
            stock: Some(input.stock),
            meta_title: Some(input.meta_title),
            meta_description: Some(input.meta_description),
            is_featured: Some(input.is_featured),
            is_trending: Some(input.is_trending),
            ..Default::default()
        })?;

        let product = self.catalog.insert_product(product).await?;
        info!(product_id = %product.id, sku = %product.sku, "product created");
        Ok(product)
    }

    /// Patch an active product. Only the patched columns are written.
    pub async fn update_product(&self, id: &ProductId, patch: ProductPatch) -> StoreResult<Product> {
        patch.validate()?;
        self.get_product(id).await?;
        if let Some(category_id) = &patch.category_id {
            self.check_category(category_id).await?;
        }
        if let Some(Some(brand_id)) = &patch.brand_id {
            self.check_brand(brand_id).await?;
        }
        let product = self.patch_product(id, &patch).await?;
        debug!(product_id = %id, "product updated");
        Ok(product)
    }

    /// Soft-delete an active product.
    pub async fn delete_product(&self, id: &ProductId) -> StoreResult<()> {
        self.get_product(id).await?;
        let patch = ProductPatch {
            is_active: Some(false),
            ..Default::default()
        };
        self.patch_product(id, &patch).await?;
        info!(product_id = %id, "product deactivated");
        Ok(())
    }

    /// Get an active product by id.
    pub async fn get_product(&self, id: &ProductId) -> StoreResult<Product> {
        match self.catalog.get_product(id).await? {
            Some(product) if product.is_active => Ok(product),
            _ => Err(CommerceError::ProductNotFound(id.to_string())),
        }
    }

    /// Get an active product by slug.
    pub async fn get_product_by_slug(&self, slug: &str) -> StoreResult<Product> {
        match self.catalog.find_product_by_slug(slug).await? {
            Some(product) if product.is_active => Ok(product),
            _ => Err(CommerceError::ProductNotFound(slug.to_string())),
        }
    }

    /// Get a product by id whether active or not, for inventory work.
    pub async fn get_any_product(&self, id: &ProductId) -> StoreResult<Product> {
        self.catalog
            .get_product(id)
            .await?
            .ok_or_else(|| CommerceError::ProductNotFound(id.to_string()))
    }

    /// Run a filtered, sorted, paginated listing.
    pub async fn list_products(&self, query: &ProductQuery) -> StoreResult<SearchResults<Product>> {
        self.catalog.page_products(query).await
    }

    /// Free-text search. A blank term matches nothing.
    pub async fn search(
        &self,
        text: &str,
        sort: SortOption,
        page: i64,
        page_size: i64,
    ) -> StoreResult<SearchResults<Product>> {
        if text.trim().is_empty() {
            return Ok(SearchResults::empty(page_size));
        }
        self.listing(ProductFilter::new().text(text), sort, page, page_size)
            .await
    }

    pub async fn featured(
        &self,
        sort: SortOption,
        page: i64,
        page_size: i64,
    ) -> StoreResult<SearchResults<Product>> {
        self.listing(ProductFilter::new().featured(), sort, page, page_size)
            .await
    }

    pub async fn on_sale(
        &self,
        sort: SortOption,
        page: i64,
        page_size: i64,
    ) -> StoreResult<SearchResults<Product>> {
        self.listing(ProductFilter::new().on_sale(), sort, page, page_size)
            .await
    }

    /// Active products with `0 < stock <= threshold`.
    pub async fn low_stock(
        &self,
        threshold: Option<i64>,
        sort: SortOption,
        page: i64,
        page_size: i64,
    ) -> StoreResult<SearchResults<Product>> {
        let threshold = threshold.unwrap_or(self.settings.low_stock_threshold);
        let filter = ProductFilter::new().stock_range(Some(1), Some(threshold));
        self.listing(filter, sort, page, page_size).await
    }

    /// Active products with no stock.
    pub async fn out_of_stock(
        &self,
        sort: SortOption,
        page: i64,
        page_size: i64,
    ) -> StoreResult<SearchResults<Product>> {
        let filter = ProductFilter::new().stock_range(None, Some(0));
        self.listing(filter, sort, page, page_size).await
    }

    /// Active products of an active brand.
    pub async fn brand_products(
        &self,
        brand_id: &BrandId,
        sort: SortOption,
        page: i64,
        page_size: i64,
    ) -> StoreResult<SearchResults<Product>> {
        self.get_brand(brand_id).await?;
        self.listing(ProductFilter::new().brand(brand_id.clone()), sort, page, page_size)
            .await
    }

    /// Active products whose SKU is in the list, after normalization.
    pub async fn products_by_sku(&self, skus: &[serde_json::Value]) -> StoreResult<Vec<Product>> {
        let skus = normalize_skus(skus)?;
        debug!(count = skus.len(), "looking up products by sku");
        self.catalog
            .select_products(&ProductFilter::new().skus(skus), SortOption::default())
            .await
    }

    async fn listing(
        &self,
        filter: ProductFilter,
        sort: SortOption,
        page: i64,
        page_size: i64,
    ) -> StoreResult<SearchResults<Product>> {
        let query = ProductQuery::new()
            .with_filter(filter)
            .with_sort(sort)
            .with_pagination(page, page_size, self.settings.max_page_size);
        self.list_products(&query).await
    }

    // ---- inventory ----

    /// Set a product's stock level, active or not.
    pub async fn set_stock(&self, id: &ProductId, stock: i64) -> StoreResult<Product> {
        let patch = ProductPatch {
            stock: Some(stock),
            ..Default::default()
        };
        patch.validate()?;
        let product = self.patch_product(id, &patch).await?;
        info!(product_id = %id, stock, status = product.stock_status().as_str(), "stock updated");
        Ok(product)
    }

    /// Apply a bulk update. Returns how many products were updated.
    pub async fn bulk_update(&self, ids: &[ProductId], update: BulkUpdate) -> StoreResult<u64> {
        require_ids(ids)?;
        let patch = update.into_patch()?;
        let count = self.catalog.update_products(ids, &patch).await?;
        info!(requested = ids.len(), updated = count, "bulk update applied");
        Ok(count)
    }

    /// Soft-delete every listed product. Returns how many were updated.
    pub async fn bulk_delete(&self, ids: &[ProductId]) -> StoreResult<u64> {
        require_ids(ids)?;
        let patch = ProductPatch {
            is_active: Some(false),
            ..Default::default()
        };
        let count = self.catalog.update_products(ids, &patch).await?;
        info!(requested = ids.len(), deleted = count, "bulk delete applied");
        Ok(count)
    }

    async fn patch_product(&self, id: &ProductId, patch: &ProductPatch) -> StoreResult<Product> {
        self.catalog
            .update_product(id, patch)
            .await?
            .ok_or_else(|| CommerceError::ProductNotFound(id.to_string()))
    }

    // ---- images ----

    pub async fn list_images(&self, product_id: &ProductId) -> StoreResult<Vec<ProductImage>> {
        self.get_any_product(product_id).await?;
        self.media.list_images(product_id).await
    }

    /// Images of several products, keyed by product.
    pub async fn images_for(
        &self,
        product_ids: &[ProductId],
    ) -> StoreResult<HashMap<ProductId, Vec<ProductImage>>> {
        self.media.images_for(product_ids).await
    }

    /// Attach an image. Marking it primary clears the other primaries.
    pub async fn add_image(
        &self,
        product_id: &ProductId,
        url: &str,
        alt_text: &str,
        is_primary: bool,
    ) -> StoreResult<ProductImage> {
        self.get_any_product(product_id).await?;
        let url = url.trim();
        if url.is_empty() {
            return Err(CommerceError::validation("image url is required"));
        }
        let mut image = ProductImage::new(product_id.clone(), url);
        image.alt_text = alt_text.to_string();
        image.is_primary = is_primary;
        self.media.insert_image(image).await
    }

    pub async fn delete_image(&self, image_id: &ImageId) -> StoreResult<()> {
        if !self.media.delete_image(image_id).await? {
            return Err(CommerceError::ImageNotFound(image_id.to_string()));
        }
        Ok(())
    }

    pub async fn primary_image(&self, product_id: &ProductId) -> StoreResult<ProductImage> {
        self.media
            .list_images(product_id)
            .await?
            .into_iter()
            .find(|i| i.is_primary)
            .ok_or_else(|| CommerceError::NoPrimaryImage(product_id.to_string()))
    }

    /// Make an image the product's primary one.
    pub async fn set_primary_image(
        &self,
        product_id: &ProductId,
        image_id: Option<&ImageId>,
    ) -> StoreResult<ProductImage> {
        let image_id = image_id.ok_or_else(|| CommerceError::validation("image_id is required"))?;
        self.media
            .set_primary_image(product_id, image_id)
            .await?
            .ok_or_else(|| CommerceError::ImageNotFound(image_id.to_string()))
    }

    // ---- attributes ----

    pub async fn list_attributes(&self, product_id: &ProductId) -> StoreResult<Vec<ProductAttribute>> {
        self.get_any_product(product_id).await?;
        self.media.list_attributes(product_id).await
    }

    /// Set an attribute, replacing the value if the name already exists.
    pub async fn set_attribute(
        &self,
        product_id: &ProductId,
        name: &str,
        value: &str,
    ) -> StoreResult<ProductAttribute> {
        self.get_any_product(product_id).await?;
        let attribute = ProductAttribute::new(product_id.clone(), name, value)?;
        self.media.upsert_attribute(attribute).await
    }

    pub async fn delete_attribute(&self, id: &AttributeId) -> StoreResult<()> {
        if !self.media.delete_attribute(id).await? {
            return Err(CommerceError::AttributeNotFound(id.to_string()));
        }
        Ok(())
    }

    // ---- categories ----

    /// Active categories ordered by name.
    pub async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let mut categories = self.catalog.list_categories().await?;
        categories.retain(|c| c.is_active);
        Ok(categories)
    }

    pub async fn get_category(&self, id: &CategoryId) -> StoreResult<Category> {
        match self.catalog.get_category(id).await? {
            Some(category) if category.is_active => Ok(category),
            _ => Err(CommerceError::CategoryNotFound(id.to_string())),
        }
    }

    pub async fn get_category_by_slug(&self, slug: &str) -> StoreResult<Category> {
        match self.catalog.find_category_by_slug(slug).await? {
            Some(category) if category.is_active => Ok(category),
            _ => Err(CommerceError::CategoryNotFound(slug.to_string())),
        }
    }

    pub async fn create_category(&self, input: NewCategory) -> StoreResult<Category> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(CommerceError::validation("name is required"));
        }
        let mut category = match &input.parent_id {
            Some(parent_id) => {
                let parent = self.catalog.get_category(parent_id).await?.ok_or_else(|| {
                    CommerceError::validation(format!("parent category {} does not exist", parent_id))
                })?;
                Category::new_child(&parent, name.as_str())
            }
            None => Category::new_root(name.as_str()),
        };
        category.slug = self.resolve_slug(SlugScope::Category, &name, input.slug).await?;
        category.description = input.description;
        category.image_url = input.image_url;

        let category = self.catalog.insert_category(category).await?;
        info!(category_id = %category.id, slug = %category.slug, "category created");
        Ok(category)
    }

    // ---- brands ----

    /// Active brands ordered by name.
    pub async fn list_brands(&self) -> StoreResult<Vec<Brand>> {
        let mut brands = self.catalog.list_brands().await?;
        brands.retain(|b| b.is_active);
        Ok(brands)
    }

    pub async fn get_brand(&self, id: &BrandId) -> StoreResult<Brand> {
        match self.catalog.get_brand(id).await? {
            Some(brand) if brand.is_active => Ok(brand),
            _ => Err(CommerceError::BrandNotFound(id.to_string())),
        }
    }

    pub async fn get_brand_by_slug(&self, slug: &str) -> StoreResult<Brand> {
        match self.catalog.find_brand_by_slug(slug).await? {
            Some(brand) if brand.is_active => Ok(brand),
            _ => Err(CommerceError::BrandNotFound(slug.to_string())),
        }
    }

    pub async fn create_brand(&self, input: NewBrand) -> StoreResult<Brand> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(CommerceError::validation("name is required"));
        }
        let mut brand = Brand::new(name.as_str());
        brand.slug = self.resolve_slug(SlugScope::Brand, &name, input.slug).await?;
        brand.description = input.description;
        brand.logo_url = input.logo_url;

        let brand = self.catalog.insert_brand(brand).await?;
        info!(brand_id = %brand.id, slug = %brand.slug, "brand created");
        Ok(brand)
    }

    // ---- helpers ----

    async fn check_category(&self, id: &CategoryId) -> StoreResult<()> {
        if self.catalog.get_category(id).await?.is_none() {
            return Err(CommerceError::validation(format!("category {} does not exist", id)));
        }
        Ok(())
    }

    async fn check_brand(&self, id: &BrandId) -> StoreResult<()> {
        if self.catalog.get_brand(id).await?.is_none() {
            return Err(CommerceError::validation(format!("brand {} does not exist", id)));
        }
        Ok(())
    }

    /// Use the given slug if it is valid and free, or derive a free one
    /// from the name.
    async fn resolve_slug(&self, scope: SlugScope, name: &str, given: Option<String>) -> StoreResult<String> {
        match given.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
            Some(slug) => {
                if !is_valid_slug(&slug) {
                    return Err(CommerceError::validation(format!("invalid slug: {}", slug)));
                }
                if self.slug_taken(scope, &slug).await? {
                    return Err(CommerceError::validation(format!("slug already exists: {}", slug)));
                }
                Ok(slug)
            }
            None => {
                for candidate in slug_candidates(name) {
                    if !self.slug_taken(scope, &candidate).await? {
                        return Ok(candidate);
                    }
                }
                Err(CommerceError::validation(format!("no free slug for {}", name)))
            }
        }
    }

    async fn slug_taken(&self, scope: SlugScope, slug: &str) -> StoreResult<bool> {
        match scope {
            SlugScope::Product => self.catalog.product_slug_exists(slug).await,
            SlugScope::Category => self.catalog.category_slug_exists(slug).await,
            SlugScope::Brand => self.catalog.brand_slug_exists(slug).await,
        }
    }
}

fn require_ids(ids: &[ProductId]) -> Result<(), CommerceError> {
    if ids.is_empty() {
        return Err(CommerceError::validation("product_ids is required"));
    }
    Ok(())
}
