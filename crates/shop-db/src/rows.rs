//! Column lists and row decoding.

use crate::DbError;
use shop_commerce::cart::{Cart, CartItem, CartOwner};
use shop_commerce::catalog::{Brand, Category, Product, ProductAttribute, ProductImage};
use shop_commerce::reviews::ProductReview;
use shop_commerce::{
    AttributeId, BrandId, CartId, CartItemId, CategoryId, Currency, ImageId, Money, ProductId,
    ReviewId, SessionKey, UserId,
};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

pub(crate) const PRODUCT_COLUMNS: &str = "id, name, slug, description, short_description, \
     price_cents, original_price_cents, currency, category_id, brand_id, stock, sku, meta_title, \
     meta_description, is_active, is_featured, is_trending, view_count, purchase_count, \
     rating_average, rating_count, created_at, updated_at";

pub(crate) const CATEGORY_COLUMNS: &str =
    "id, parent_id, name, slug, description, image_url, is_active, created_at, updated_at";

pub(crate) const BRAND_COLUMNS: &str =
    "id, name, slug, description, logo_url, is_active, created_at";

pub(crate) const IMAGE_COLUMNS: &str = "id, product_id, url, alt_text, is_primary, created_at";

pub(crate) const ATTRIBUTE_COLUMNS: &str = "id, product_id, name, value";

pub(crate) const CART_COLUMNS: &str = "id, user_id, session_key, created_at, updated_at";

pub(crate) const CART_ITEM_COLUMNS: &str =
    "id, cart_id, product_id, quantity, created_at, updated_at";

pub(crate) const REVIEW_COLUMNS: &str =
    "id, product_id, user_id, rating, review_text, is_verified_purchase, created_at, updated_at";

/// Rebuild a product. Derived fields come from the setters.
pub(crate) fn product(row: &SqliteRow) -> Result<Product, DbError> {
    let code: String = row.try_get("currency")?;
    let currency = Currency::from_code(&code)
        .ok_or_else(|| DbError::InvalidRow(format!("unknown currency {:?}", code)))?;
    let price = Money::new(row.try_get("price_cents")?, currency);
    let original_price = row
        .try_get::<Option<i64>, _>("original_price_cents")?
        .map(|cents| Money::new(cents, currency));

    let mut product = Product::new(
        row.try_get::<String, _>("name")?,
        row.try_get::<String, _>("sku")?,
        price,
        CategoryId::new(row.try_get::<String, _>("category_id")?),
    );
    product
        .set_original_price(original_price)
        .map_err(|e| DbError::InvalidRow(e.to_string()))?;
    product
        .set_stock(row.try_get("stock")?)
        .map_err(|e| DbError::InvalidRow(e.to_string()))?;

    product.id = ProductId::new(row.try_get::<String, _>("id")?);
    product.slug = row.try_get("slug")?;
    product.description = row.try_get("description")?;
    product.short_description = row.try_get("short_description")?;
    product.brand_id = row.try_get::<Option<String>, _>("brand_id")?.map(BrandId::new);
    product.meta_title = row.try_get("meta_title")?;
    product.meta_description = row.try_get("meta_description")?;
    product.is_active = row.try_get("is_active")?;
    product.is_featured = row.try_get("is_featured")?;
    product.is_trending = row.try_get("is_trending")?;
    product.view_count = row.try_get("view_count")?;
    product.purchase_count = row.try_get("purchase_count")?;
    product.rating_average = row.try_get("rating_average")?;
    product.rating_count = row.try_get("rating_count")?;
    product.created_at = row.try_get("created_at")?;
    product.updated_at = row.try_get("updated_at")?;
    Ok(product)
}

pub(crate) fn category(row: &SqliteRow) -> Result<Category, DbError> {
    Ok(Category {
        id: CategoryId::new(row.try_get::<String, _>("id")?),
        parent_id: row.try_get::<Option<String>, _>("parent_id")?.map(CategoryId::new),
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        description: row.try_get("description")?,
        image_url: row.try_get("image_url")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub(crate) fn brand(row: &SqliteRow) -> Result<Brand, DbError> {
    Ok(Brand {
        id: BrandId::new(row.try_get::<String, _>("id")?),
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        description: row.try_get("description")?,
        logo_url: row.try_get("logo_url")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
    })
}

pub(crate) fn image(row: &SqliteRow) -> Result<ProductImage, DbError> {
    Ok(ProductImage {
        id: ImageId::new(row.try_get::<String, _>("id")?),
        product_id: ProductId::new(row.try_get::<String, _>("product_id")?),
        url: row.try_get("url")?,
        alt_text: row.try_get("alt_text")?,
        is_primary: row.try_get("is_primary")?,
        created_at: row.try_get("created_at")?,
    })
}

pub(crate) fn attribute(row: &SqliteRow) -> Result<ProductAttribute, DbError> {
    Ok(ProductAttribute {
        id: AttributeId::new(row.try_get::<String, _>("id")?),
        product_id: ProductId::new(row.try_get::<String, _>("product_id")?),
        name: row.try_get("name")?,
        value: row.try_get("value")?,
    })
}

pub(crate) fn cart(row: &SqliteRow) -> Result<Cart, DbError> {
    let user_id: Option<String> = row.try_get("user_id")?;
    let session_key: Option<String> = row.try_get("session_key")?;
    let owner = match (user_id, session_key) {
        (Some(user_id), None) => CartOwner::User(UserId::new(user_id)),
        (None, Some(key)) => CartOwner::Session(SessionKey::new(key)),
        _ => return Err(DbError::InvalidRow("cart must have exactly one owner".into())),
    };
    Ok(Cart {
        id: CartId::new(row.try_get::<String, _>("id")?),
        owner,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub(crate) fn cart_item(row: &SqliteRow) -> Result<CartItem, DbError> {
    Ok(CartItem {
        id: CartItemId::new(row.try_get::<String, _>("id")?),
        cart_id: CartId::new(row.try_get::<String, _>("cart_id")?),
        product_id: ProductId::new(row.try_get::<String, _>("product_id")?),
        quantity: row.try_get("quantity")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub(crate) fn review(row: &SqliteRow) -> Result<ProductReview, DbError> {
    Ok(ProductReview {
        id: ReviewId::new(row.try_get::<String, _>("id")?),
        product_id: ProductId::new(row.try_get::<String, _>("product_id")?),
        user_id: UserId::new(row.try_get::<String, _>("user_id")?),
        rating: row.try_get("rating")?,
        review_text: row.try_get("review_text")?,
        is_verified_purchase: row.try_get("is_verified_purchase")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Decode every row, stopping at the first bad one.
pub(crate) fn all<T>(
    rows: &[SqliteRow],
    decode: fn(&SqliteRow) -> Result<T, DbError>,
) -> Result<Vec<T>, DbError> {
    rows.iter().map(decode).collect()
}
