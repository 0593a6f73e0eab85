//! Repository traits implemented by the storage layer.
//!
//! Every method is one atomic store operation. Methods that combine a read
//! with a write (find-or-create, insert-if-absent, increment) must not lose
//! updates under concurrent calls.

use crate::analytics::ProductView;
use crate::cart::{Cart, CartItem, CartOwner};
use crate::catalog::{Brand, Category, Product, ProductAttribute, ProductImage, ProductPatch};
use crate::error::CommerceError;
use crate::ids::{
    AttributeId, BrandId, CartId, CartItemId, CategoryId, ImageId, ProductId, ReviewId,
};
use crate::reviews::{ProductReview, RatingSummary};
use crate::search::{ProductFilter, ProductQuery, SearchResults, SortOption};
use async_trait::async_trait;
use std::collections::HashMap;

/// Result type for repository calls.
pub type StoreResult<T> = Result<T, CommerceError>;

/// Products, categories and brands.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Insert a new product. A taken sku or slug is a validation error.
    async fn insert_product(&self, product: Product) -> StoreResult<Product>;

    /// Write only the fields the patch sets, plus `updated_at`, and return the
    /// stored product. Counters (`view_count`, ratings) are never written
    /// here. `None` if the product doesn't exist. A sku or slug taken by
    /// another product is a validation error.
    async fn update_product(
        &self,
        id: &ProductId,
        patch: &ProductPatch,
    ) -> StoreResult<Option<Product>>;

    /// Get a product by id, active or not.
    async fn get_product(&self, id: &ProductId) -> StoreResult<Option<Product>>;

    /// Get a product by slug, active or not.
    async fn find_product_by_slug(&self, slug: &str) -> StoreResult<Option<Product>>;

    /// Check whether any product uses `slug`.
    async fn product_slug_exists(&self, slug: &str) -> StoreResult<bool>;

    /// All products matching `filter`, ordered by `sort`. Ties keep
    /// insertion order.
    async fn select_products(
        &self,
        filter: &ProductFilter,
        sort: SortOption,
    ) -> StoreResult<Vec<Product>>;

    /// One page of products matching the query's filter, in its sort order,
    /// with the total match count.
    async fn page_products(&self, query: &ProductQuery) -> StoreResult<SearchResults<Product>>;

    /// Apply one patch to every listed product that exists. All or nothing:
    /// if any row fails, no row changes. Returns how many were updated.
    async fn update_products(&self, ids: &[ProductId], patch: &ProductPatch) -> StoreResult<u64>;

    async fn insert_category(&self, category: Category) -> StoreResult<Category>;

    async fn get_category(&self, id: &CategoryId) -> StoreResult<Option<Category>>;

    async fn find_category_by_slug(&self, slug: &str) -> StoreResult<Option<Category>>;

    async fn category_slug_exists(&self, slug: &str) -> StoreResult<bool>;

    /// Categories ordered by name.
    async fn list_categories(&self) -> StoreResult<Vec<Category>>;

    async fn insert_brand(&self, brand: Brand) -> StoreResult<Brand>;

    async fn get_brand(&self, id: &BrandId) -> StoreResult<Option<Brand>>;

    async fn find_brand_by_slug(&self, slug: &str) -> StoreResult<Option<Brand>>;

    async fn brand_slug_exists(&self, slug: &str) -> StoreResult<bool>;

    /// Brands ordered by name.
    async fn list_brands(&self) -> StoreResult<Vec<Brand>>;
}

/// Product images and attributes.
#[async_trait]
pub trait MediaRepository: Send + Sync {
    /// Insert an image. A primary image clears the product's other primaries.
    async fn insert_image(&self, image: ProductImage) -> StoreResult<ProductImage>;

    /// Images for a product, in insertion order.
    async fn list_images(&self, product_id: &ProductId) -> StoreResult<Vec<ProductImage>>;

    /// Images for several products at once, keyed by product.
    async fn images_for(
        &self,
        product_ids: &[ProductId],
    ) -> StoreResult<HashMap<ProductId, Vec<ProductImage>>>;

    /// Delete an image. Returns false if it didn't exist.
    async fn delete_image(&self, id: &ImageId) -> StoreResult<bool>;

    /// Make `image_id` the product's only primary image. `None` if the image
    /// doesn't belong to the product, in which case nothing changes.
    async fn set_primary_image(
        &self,
        product_id: &ProductId,
        image_id: &ImageId,
    ) -> StoreResult<Option<ProductImage>>;

    /// Insert an attribute, or replace the value of the product's attribute
    /// with the same name.
    async fn upsert_attribute(&self, attribute: ProductAttribute) -> StoreResult<ProductAttribute>;

    async fn list_attributes(&self, product_id: &ProductId) -> StoreResult<Vec<ProductAttribute>>;

    /// Delete an attribute. Returns false if it didn't exist.
    async fn delete_attribute(&self, id: &AttributeId) -> StoreResult<bool>;
}

/// Carts and their items.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Return the owner's cart, creating an empty one if none exists.
    async fn find_or_create_cart(&self, owner: &CartOwner) -> StoreResult<Cart>;

    /// Return the owner's cart without creating one.
    async fn find_cart(&self, owner: &CartOwner) -> StoreResult<Option<Cart>>;

    /// Items in a cart, in insertion order.
    async fn cart_items(&self, cart_id: &CartId) -> StoreResult<Vec<CartItem>>;

    /// Create the `(cart, product)` line with `quantity`, or add `quantity`
    /// to the existing line. A sum past `i64::MAX` is an overflow error and
    /// leaves the line unchanged.
    async fn add_or_increment(
        &self,
        cart_id: &CartId,
        product_id: &ProductId,
        quantity: i64,
    ) -> StoreResult<CartItem>;

    /// Set the quantity of an item in this cart. `None` if the item isn't in
    /// the cart.
    async fn set_item_quantity(
        &self,
        cart_id: &CartId,
        item_id: &CartItemId,
        quantity: i64,
    ) -> StoreResult<Option<CartItem>>;

    /// Remove an item from this cart. Returns false if it isn't in the cart.
    async fn remove_item(&self, cart_id: &CartId, item_id: &CartItemId) -> StoreResult<bool>;

    /// Remove every item from the cart. Returns how many were removed.
    async fn clear_cart(&self, cart_id: &CartId) -> StoreResult<u64>;
}

/// Reviews and the rating aggregate they feed.
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Insert a review. A second review of the product by the same user is
    /// a validation error.
    async fn insert_review(&self, review: ProductReview) -> StoreResult<ProductReview>;

    async fn get_review(&self, id: &ReviewId) -> StoreResult<Option<ProductReview>>;

    /// Store the editable fields of a review (`rating`, `review_text`,
    /// `updated_at`).
    async fn save_review(&self, review: &ProductReview) -> StoreResult<()>;

    /// Delete a review. Returns false if it didn't exist.
    async fn delete_review(&self, id: &ReviewId) -> StoreResult<bool>;

    /// Reviews of a product, newest first.
    async fn reviews_for(&self, product_id: &ProductId) -> StoreResult<Vec<ProductReview>>;

    /// Recompute the product's rating from all its reviews and store only
    /// `rating_average` and `rating_count`.
    async fn refresh_rating(&self, product_id: &ProductId) -> StoreResult<RatingSummary>;
}

/// View tracking.
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// Record a view unless the same viewer already has one for the product.
    /// The product's `view_count` goes up only when a record is inserted.
    /// Returns whether it was inserted.
    async fn record_view(&self, view: ProductView) -> StoreResult<bool>;

    /// View records created at or after `since`, counted per product.
    async fn view_counts_since(&self, since: i64) -> StoreResult<HashMap<ProductId, i64>>;

    /// View records of one product created at or after `since`.
    async fn product_views_since(&self, product_id: &ProductId, since: i64) -> StoreResult<i64>;
}
