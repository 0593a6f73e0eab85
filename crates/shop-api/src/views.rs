//! JSON response bodies.
//!
//! Prices leave the API as two-place decimal strings (`"49.99"`).

use serde::Serialize;
use shop_commerce::catalog::display_image;
use shop_commerce::prelude::*;
use std::collections::HashMap;

fn price(money: &Money) -> String {
    money.display_amount()
}

/// A product as it appears in listings.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub short_description: String,
    pub price: String,
    pub original_price: Option<String>,
    pub discount_percentage: f64,
    pub discount_amount: String,
    pub is_on_sale: bool,
    pub category: CategoryId,
    pub brand: Option<BrandId>,
    pub sku: String,
    pub stock: i64,
    pub stock_status: StockStatus,
    pub is_featured: bool,
    pub is_trending: bool,
    pub rating_average: f64,
    pub rating_count: i64,
    /// Primary image, else the first image.
    pub image: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ProductResponse {
    pub fn new(product: &Product, images: &[ProductImage]) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            slug: product.slug.clone(),
            short_description: product.short_description.clone(),
            price: price(&product.price()),
            original_price: product.original_price().as_ref().map(price),
            discount_percentage: product.discount_percentage(),
            discount_amount: price(&product.discount_amount()),
            is_on_sale: product.is_on_sale(),
            category: product.category_id.clone(),
            brand: product.brand_id.clone(),
            sku: product.sku.clone(),
            stock: product.stock(),
            stock_status: product.stock_status(),
            is_featured: product.is_featured,
            is_trending: product.is_trending,
            rating_average: product.rating_average,
            rating_count: product.rating_count,
            image: display_image(images).map(|i| i.url.clone()),
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }

    /// Render several products with their images looked up in one map.
    pub fn many(products: &[Product], images: &HashMap<ProductId, Vec<ProductImage>>) -> Vec<Self> {
        products
            .iter()
            .map(|p| Self::new(p, images.get(&p.id).map(Vec::as_slice).unwrap_or(&[])))
            .collect()
    }
}

/// A product detail page.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: ProductResponse,
    pub description: String,
    pub meta_title: String,
    pub meta_description: String,
    pub is_active: bool,
    pub view_count: i64,
    pub purchase_count: i64,
    pub images: Vec<ProductImage>,
    pub attributes: Vec<ProductAttribute>,
}

impl ProductDetail {
    pub fn new(product: &Product, images: Vec<ProductImage>, attributes: Vec<ProductAttribute>) -> Self {
        Self {
            product: ProductResponse::new(product, &images),
            description: product.description.clone(),
            meta_title: product.meta_title.clone(),
            meta_description: product.meta_description.clone(),
            is_active: product.is_active,
            view_count: product.view_count,
            purchase_count: product.purchase_count,
            images,
            attributes,
        }
    }
}

/// A trending product with its windowed view count.
#[derive(Debug, Serialize)]
pub struct TrendingResponse {
    #[serde(flatten)]
    pub product: ProductResponse,
    pub recent_views: i64,
}

/// One page of a listing.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_previous: bool,
    pub results: Vec<T>,
}

impl<T> From<SearchResults<T>> for Page<T> {
    fn from(results: SearchResults<T>) -> Self {
        let p = results.pagination;
        Self {
            count: p.count,
            page: p.page,
            page_size: p.page_size,
            total_pages: p.total_pages,
            has_next: p.has_next,
            has_previous: p.has_previous,
            results: results.items,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CartItemResponse {
    pub id: CartItemId,
    pub product: ProductId,
    pub product_name: String,
    pub product_price: String,
    pub product_image: Option<String>,
    pub quantity: i64,
}

impl From<&CartLine> for CartItemResponse {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.item.id.clone(),
            product: line.item.product_id.clone(),
            product_name: line.product_name.clone(),
            product_price: price(&line.product_price),
            product_image: line.product_image.clone(),
            quantity: line.item.quantity,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub id: CartId,
    pub user: Option<UserId>,
    pub session_key: Option<SessionKey>,
    pub items: Vec<CartItemResponse>,
    pub item_count: i64,
    pub subtotal: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl CartResponse {
    pub fn new(details: &CartDetails) -> Result<Self, CommerceError> {
        let cart = &details.cart;
        Ok(Self {
            id: cart.id.clone(),
            user: cart.owner.user_id().cloned(),
            session_key: cart.owner.session_key().cloned(),
            items: details.lines.iter().map(CartItemResponse::from).collect(),
            item_count: details.item_count()?,
            subtotal: price(&details.subtotal()?),
            created_at: cart.created_at,
            updated_at: cart.updated_at,
        })
    }
}

/// `{success, item}` for cart mutations.
#[derive(Debug, Serialize)]
pub struct CartItemEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<CartItemResponse>,
}

impl CartItemEnvelope {
    pub fn item(line: &CartLine) -> Self {
        Self {
            success: true,
            item: Some(CartItemResponse::from(line)),
        }
    }

    pub fn ok() -> Self {
        Self {
            success: true,
            item: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StockResponse {
    pub stock: i64,
    pub stock_status: StockStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl StockResponse {
    pub fn new(product: &Product) -> Self {
        Self {
            stock: product.stock(),
            stock_status: product.stock_status(),
            message: None,
        }
    }
}

/// A created review plus the product's refreshed rating.
#[derive(Debug, Serialize)]
pub struct ReviewCreated {
    #[serde(flatten)]
    pub review: ProductReview,
    pub product_rating: RatingSummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lamp() -> Product {
        let mut product = Product::new(
            "Desk Lamp",
            "LAMP-1",
            Money::new(4999, Currency::USD),
            CategoryId::new("c1"),
        );
        product
            .set_original_price(Some(Money::new(5999, Currency::USD)))
            .unwrap();
        product
    }

    #[test]
    fn test_product_prices_render_as_decimal_strings() {
        let body = serde_json::to_value(ProductResponse::new(&lamp(), &[])).unwrap();
        assert_eq!(body["price"], json!("49.99"));
        assert_eq!(body["original_price"], json!("59.99"));
        assert_eq!(body["discount_amount"], json!("10.00"));
        assert_eq!(body["is_on_sale"], json!(true));
        assert_eq!(body["image"], json!(null));
    }

    #[test]
    fn test_detail_flattens_listing_fields() {
        let product = lamp();
        let mut image = ProductImage::new(product.id.clone(), "/media/lamp.jpg");
        image.is_primary = true;
        let body = serde_json::to_value(ProductDetail::new(&product, vec![image], vec![])).unwrap();
        assert_eq!(body["name"], json!("Desk Lamp"));
        assert_eq!(body["image"], json!("/media/lamp.jpg"));
        assert_eq!(body["images"].as_array().unwrap().len(), 1);
        assert_eq!(body["stock_status"], json!("out_of_stock"));
    }

    #[test]
    fn test_page_shape() {
        let results = SearchResults::new(vec![3], Pagination::new(2, 2, 3));
        let body = serde_json::to_value(Page::from(results)).unwrap();
        assert_eq!(body["count"], json!(3));
        assert_eq!(body["results"], json!([3]));
        assert_eq!(body["has_next"], json!(false));
        assert_eq!(body["has_previous"], json!(true));
    }
}
