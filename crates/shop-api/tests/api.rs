//! End-to-end tests of the HTTP surface over an in-memory SQLite store.

use serde_json::{json, Value};
use shop_api::axum::body::{to_bytes, Body};
use shop_api::axum::http::{HeaderMap, Method, Request, StatusCode};
use shop_api::axum::Router;
use shop_api::AppState;
use shop_commerce::prelude::*;
use shop_db::Db;
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    app: Router,
    state: AppState,
    db: Arc<Db>,
}

async fn setup() -> TestApp {
    let db = Arc::new(Db::in_memory().await.unwrap());
    let state = AppState::from_store(db.clone(), CatalogSettings::default());
    TestApp {
        app: shop_api::app(state.clone()),
        state,
        db,
    }
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> Reply {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        Reply {
            status,
            headers,
            body,
        }
    }

    async fn call(&self, method: Method, uri: &str, headers: &[(&str, &str)], body: Option<Value>) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    async fn get(&self, uri: &str) -> Reply {
        self.call(Method::GET, uri, &[], None).await
    }

    async fn cart_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM carts")
            .fetch_one(self.db.pool())
            .await
            .unwrap()
    }

    async fn seed(&self, name: &str, sku: &str, price: &str, stock: i64) -> Product {
        let category = match self.state.catalog.get_category_by_slug("general").await {
            Ok(c) => c,
            Err(_) => self
                .state
                .catalog
                .create_category(serde_json::from_value(json!({"name": "General"})).unwrap())
                .await
                .unwrap(),
        };
        let input: NewProduct = serde_json::from_value(json!({
            "name": name,
            "sku": sku,
            "price": price,
            "category": category.id,
            "stock": stock,
        }))
        .unwrap();
        self.state.catalog.create_product(input).await.unwrap()
    }
}

#[tokio::test]
async fn test_health() {
    let app = setup().await;
    let reply = app.get("/api/health").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_anonymous_cart_gets_session_and_merges() {
    let app = setup().await;
    let lamp = app.seed("Lamp", "LAMP", "19.99", 50).await;

    let first = app.get("/api/cart").await;
    assert_eq!(first.status, StatusCode::OK);
    let key = first.headers["x-session-key"].to_str().unwrap().to_string();
    assert!(key.starts_with("sess_"));
    assert_eq!(first.body["items"], json!([]));
    assert_eq!(first.body["session_key"], json!(key));

    let session = [("x-session-key", key.as_str())];
    let add = app
        .call(Method::POST, "/api/cart/add", &session, Some(json!({"product": lamp.id, "quantity": 2})))
        .await;
    assert_eq!(add.status, StatusCode::OK);
    assert_eq!(add.body["success"], json!(true));
    assert_eq!(add.body["item"]["quantity"], json!(2));
    assert!(add.headers.get("x-session-key").is_none());

    let add = app
        .call(Method::POST, "/api/cart/add", &session, Some(json!({"product": lamp.id, "quantity": "3"})))
        .await;
    assert_eq!(add.body["item"]["quantity"], json!(5));
    assert_eq!(add.body["item"]["product_name"], json!("Lamp"));
    assert_eq!(add.body["item"]["product_price"], json!("19.99"));

    let cart = app.call(Method::GET, "/api/cart", &session, None).await;
    assert_eq!(cart.body["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart.body["item_count"], json!(5));
    assert_eq!(cart.body["subtotal"], json!("99.95"));
}

#[tokio::test]
async fn test_cart_item_updates_and_clear() {
    let app = setup().await;
    let lamp = app.seed("Lamp", "LAMP", "10.00", 50).await;
    let alice = [("x-user-id", "alice")];

    let add = app
        .call(Method::POST, "/api/cart/add", &alice, Some(json!({"product": lamp.id})))
        .await;
    assert_eq!(add.body["item"]["quantity"], json!(1));
    let item_id = add.body["item"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/cart/items/{}", item_id);

    let update = app
        .call(Method::PATCH, &uri, &alice, Some(json!({"quantity": 4})))
        .await;
    assert_eq!(update.status, StatusCode::OK);
    assert_eq!(update.body["item"]["quantity"], json!(4));

    let bob = [("x-user-id", "bob")];
    let foreign = app.call(Method::PATCH, &uri, &bob, Some(json!({"quantity": 1}))).await;
    assert_eq!(foreign.status, StatusCode::NOT_FOUND);
    assert!(foreign.body["detail"].is_string());

    let clear = app.call(Method::POST, "/api/cart/clear", &alice, None).await;
    assert_eq!(clear.body, json!({"success": true}));
    let cart = app.call(Method::GET, "/api/cart", &alice, None).await;
    assert_eq!(cart.body["items"], json!([]));
    assert_eq!(cart.body["user"], json!("alice"));

    let gone = app.call(Method::DELETE, &uri, &alice, None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cart_add_rejects_bad_input() {
    let app = setup().await;
    let lamp = app.seed("Lamp", "LAMP", "10.00", 50).await;
    let alice = [("x-user-id", "alice")];

    let bad = app
        .call(Method::POST, "/api/cart/add", &alice, Some(json!({"product": lamp.id, "quantity": "many"})))
        .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);

    let zero = app
        .call(Method::POST, "/api/cart/add", &alice, Some(json!({"product": lamp.id, "quantity": 0})))
        .await;
    assert_eq!(zero.status, StatusCode::BAD_REQUEST);

    let missing = app
        .call(Method::POST, "/api/cart/add", &alice, Some(json!({"product": "nope"})))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/cart/add")
        .header("content-type", "application/json")
        .header("x-user-id", "alice")
        .body(Body::from("{not json"))
        .unwrap();
    let malformed = app.send(request).await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert!(malformed.body["detail"].is_string());
}

#[tokio::test]
async fn test_product_listing_filters_and_pages() {
    let app = setup().await;
    app.seed("Cheap", "C1", "5.00", 50).await;
    app.seed("Middle", "M1", "25.00", 5).await;
    app.seed("Pricey", "P1", "90.00", 0).await;

    let all = app.get("/api/products?sort_by=price").await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.body["count"], json!(3));
    let names: Vec<_> = all.body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["Cheap", "Middle", "Pricey"]);

    let ranged = app.get("/api/products?min_price=10&max_price=50").await;
    assert_eq!(ranged.body["count"], json!(1));
    assert_eq!(ranged.body["results"][0]["price"], json!("25.00"));

    let limited = app.get("/api/products/filter?stock_status=limited_stock").await;
    assert_eq!(limited.body["results"][0]["sku"], json!("M1"));

    let paged = app.get("/api/products?page=2&page_size=2").await;
    assert_eq!(paged.body["results"].as_array().unwrap().len(), 1);
    assert_eq!(paged.body["total_pages"], json!(2));
    assert_eq!(paged.body["has_previous"], json!(true));

    let bad = app.get("/api/products?min_price=abc").await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    let bad = app.get("/api/products?stock_status=plenty").await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);

    let unknown_sort = app.get("/api/products?sort_by=popularity").await;
    assert_eq!(unknown_sort.status, StatusCode::OK);
}

#[tokio::test]
async fn test_search_and_sku_lookup() {
    let app = setup().await;
    app.seed("Walnut Desk", "123", "150.00", 3).await;
    app.seed("Oak Chair", "456", "80.00", 3).await;

    let empty = app.get("/api/products/search?q=").await;
    assert_eq!(empty.body["count"], json!(0));
    let hit = app.get("/api/products/search?q=walnut").await;
    assert_eq!(hit.body["results"][0]["sku"], json!("123"));

    let by_sku = app
        .call(Method::POST, "/api/products/by-sku", &[], Some(json!({"skus": ["123.0", 456]})))
        .await;
    assert_eq!(by_sku.status, StatusCode::OK);
    assert_eq!(by_sku.body.as_array().unwrap().len(), 2);

    let invalid = app
        .call(Method::POST, "/api/products/by-sku", &[], Some(json!({"skus": []})))
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.body, json!({"detail": "Invalid or empty SKU list."}));
}

#[tokio::test]
async fn test_detail_records_views_once_per_viewer() {
    let app = setup().await;
    let lamp = app.seed("Lamp", "LAMP", "10.00", 50).await;
    let uri = format!("/api/products/{}", lamp.id);
    let from = |ip: &'static str| [("x-forwarded-for", ip)];

    let first = app.call(Method::GET, &uri, &from("198.51.100.1"), None).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["view_count"], json!(1));
    let again = app.call(Method::GET, &uri, &from("198.51.100.1"), None).await;
    assert_eq!(again.body["view_count"], json!(1));

    let slug = app
        .call(Method::GET, "/api/products/slug/lamp", &from("198.51.100.2"), None)
        .await;
    assert_eq!(slug.body["view_count"], json!(2));

    let tracked = app
        .call(Method::POST, &format!("{}/view", uri), &[], None)
        .await;
    assert_eq!(tracked.body, json!({"status": "view tracked"}));

    let analytics = app.get(&format!("{}/analytics", uri)).await;
    assert_eq!(analytics.body["total_views"], json!(3));
    assert_eq!(analytics.body["stock_status"], json!("in_stock"));
}

#[tokio::test]
async fn test_product_update_and_soft_delete() {
    let app = setup().await;
    let lamp = app.seed("Lamp", "LAMP", "10.00", 50).await;
    let uri = format!("/api/products/{}", lamp.id);

    let patched = app
        .call(Method::PATCH, &uri, &[], Some(json!({"price": "8.00", "original_price": "10.00"})))
        .await;
    assert_eq!(patched.status, StatusCode::OK);
    assert_eq!(patched.body["is_on_sale"], json!(true));
    assert_eq!(patched.body["discount_percentage"], json!(20.0));

    let on_sale = app.get("/api/products/on-sale").await;
    assert_eq!(on_sale.body["count"], json!(1));

    let deleted = app.call(Method::DELETE, &uri, &[], None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    let missing = app.get(&uri).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stock_endpoints_require_user() {
    let app = setup().await;
    let lamp = app.seed("Lamp", "LAMP", "10.00", 50).await;
    let uri = format!("/api/products/{}/stock", lamp.id);
    let admin = [("x-user-id", "admin")];

    let anonymous = app.call(Method::POST, &uri, &[], Some(json!({"stock": 3}))).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let set = app.call(Method::POST, &uri, &admin, Some(json!({"stock": 3}))).await;
    assert_eq!(set.status, StatusCode::OK);
    assert_eq!(
        set.body,
        json!({"stock": 3, "stock_status": "limited_stock", "message": "Stock updated successfully"})
    );

    let negative = app.call(Method::POST, &uri, &admin, Some(json!({"stock": -1}))).await;
    assert_eq!(negative.body, json!({"detail": "stock cannot be negative"}));

    let low = app.get("/api/products/low-stock").await;
    assert_eq!(low.body["count"], json!(1));
    let out = app.get("/api/products/out-of-stock").await;
    assert_eq!(out.body["count"], json!(0));
}

#[tokio::test]
async fn test_bulk_operations() {
    let app = setup().await;
    let a = app.seed("A", "A", "10.00", 5).await;
    let b = app.seed("B", "B", "10.00", 5).await;
    let admin = [("x-user-id", "admin")];

    let missing = app
        .call(Method::POST, "/api/products/bulk-update", &admin, Some(json!({"update_data": {"is_featured": true}})))
        .await;
    assert_eq!(missing.body, json!({"detail": "product_ids is required"}));

    let updated = app
        .call(
            Method::POST,
            "/api/products/bulk-update",
            &admin,
            Some(json!({"product_ids": [a.id, b.id], "update_data": {"is_featured": true}})),
        )
        .await;
    assert_eq!(updated.body["updated_count"], json!(2));
    assert_eq!(app.get("/api/products/featured").await.body["count"], json!(2));

    let deleted = app
        .call(Method::POST, "/api/products/bulk-delete", &admin, Some(json!({"product_ids": [a.id]})))
        .await;
    assert_eq!(deleted.body["deleted_count"], json!(1));
    assert_eq!(app.get("/api/products").await.body["count"], json!(1));
}

#[tokio::test]
async fn test_reviews_flow() {
    let app = setup().await;
    let lamp = app.seed("Lamp", "LAMP", "10.00", 50).await;
    let uri = format!("/api/products/{}/reviews", lamp.id);

    let anonymous = app.call(Method::POST, &uri, &[], Some(json!({"rating": 5}))).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    for (user, rating) in [("u1", 4), ("u2", 5), ("u3", 3)] {
        let created = app
            .call(Method::POST, &uri, &[("x-user-id", user)], Some(json!({"rating": rating})))
            .await;
        assert_eq!(created.status, StatusCode::CREATED);
    }

    let stats = app.get(&format!("{}/stats", uri)).await;
    assert_eq!(stats.body["total_reviews"], json!(3));
    assert_eq!(stats.body["average_rating"], json!(4.0));
    assert_eq!(stats.body["rating_distribution"]["5_star"], json!(1));

    let out_of_range = app
        .call(Method::POST, &uri, &[("x-user-id", "u4")], Some(json!({"rating": 9})))
        .await;
    assert_eq!(out_of_range.status, StatusCode::BAD_REQUEST);

    let list = app.get(&uri).await;
    let review_id = list.body[0]["id"].as_str().unwrap().to_string();
    let author = list.body[0]["user_id"].as_str().unwrap().to_string();
    let review_uri = format!("/api/reviews/{}", review_id);

    let stranger = app
        .call(Method::DELETE, &review_uri, &[("x-user-id", "stranger")], None)
        .await;
    assert_eq!(stranger.status, StatusCode::NOT_FOUND);

    let removed = app
        .call(Method::DELETE, &review_uri, &[("x-user-id", author.as_str())], None)
        .await;
    assert_eq!(removed.status, StatusCode::NO_CONTENT);
    let detail = app.get(&format!("/api/products/{}", lamp.id)).await;
    assert_eq!(detail.body["rating_count"], json!(2));
}

#[tokio::test]
async fn test_images_and_attributes() {
    let app = setup().await;
    let lamp = app.seed("Lamp", "LAMP", "10.00", 50).await;
    let images = format!("/api/products/{}/images", lamp.id);

    let none = app.get(&format!("{}/primary", images)).await;
    assert_eq!(none.status, StatusCode::NOT_FOUND);
    assert_eq!(none.body, json!({"detail": "No primary image found"}));

    let added = app
        .call(Method::POST, &images, &[], Some(json!({"url": "/media/lamp.jpg", "alt_text": "Lamp"})))
        .await;
    assert_eq!(added.status, StatusCode::CREATED);
    let image_id = added.body["id"].clone();

    let required = app
        .call(Method::POST, &format!("{}/primary", images), &[], Some(json!({})))
        .await;
    assert_eq!(required.body, json!({"detail": "image_id is required"}));

    let primary = app
        .call(Method::POST, &format!("{}/primary", images), &[], Some(json!({"image_id": image_id})))
        .await;
    assert_eq!(primary.body["is_primary"], json!(true));

    let attrs = format!("/api/products/{}/attributes", lamp.id);
    app.call(Method::POST, &attrs, &[], Some(json!({"name": "Color", "value": "Red"})))
        .await;
    app.call(Method::POST, &attrs, &[], Some(json!({"name": "Color", "value": "Blue"})))
        .await;
    let listed = app.get(&attrs).await;
    assert_eq!(listed.body.as_array().unwrap().len(), 1);
    assert_eq!(listed.body[0]["value"], json!("Blue"));

    let detail = app.get(&format!("/api/products/{}", lamp.id)).await;
    assert_eq!(detail.body["image"], json!("/media/lamp.jpg"));
}

#[tokio::test]
async fn test_brands_and_categories() {
    let app = setup().await;
    let created = app
        .call(Method::POST, "/api/brands", &[], Some(json!({"name": "Acme Audio"})))
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["slug"], json!("acme-audio"));

    let by_slug = app.get("/api/brands/slug/acme-audio").await;
    assert_eq!(by_slug.body["name"], json!("Acme Audio"));

    let brand_id = created.body["id"].as_str().unwrap().to_string();
    let products = app.get(&format!("/api/brands/{}/products", brand_id)).await;
    assert_eq!(products.body["count"], json!(0));

    let missing = app.get("/api/brands/nope/products").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    app.call(Method::POST, "/api/categories", &[], Some(json!({"name": "Lighting"})))
        .await;
    let categories = app.get("/api/categories").await;
    assert_eq!(categories.body[0]["slug"], json!("lighting"));
    let dup = app
        .call(Method::POST, "/api/categories", &[], Some(json!({"name": "Other", "slug": "lighting"})))
        .await;
    assert_eq!(dup.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rejected_anonymous_add_allocates_nothing() {
    let app = setup().await;
    let lamp = app.seed("Lamp", "LAMP", "10.00", 50).await;

    let missing = app
        .call(Method::POST, "/api/cart/add", &[], Some(json!({"product": "nope"})))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert!(missing.headers.get("x-session-key").is_none());
    let zero = app
        .call(Method::POST, "/api/cart/add", &[], Some(json!({"product": lamp.id, "quantity": 0})))
        .await;
    assert_eq!(zero.status, StatusCode::BAD_REQUEST);
    assert!(zero.headers.get("x-session-key").is_none());
    assert_eq!(app.cart_count().await, 0);

    let added = app
        .call(Method::POST, "/api/cart/add", &[], Some(json!({"product": lamp.id})))
        .await;
    assert_eq!(added.status, StatusCode::OK);
    let key = added.headers["x-session-key"].to_str().unwrap().to_string();
    let retry = app
        .call(Method::POST, "/api/cart/add", &[("x-session-key", key.as_str())], Some(json!({"product": "nope"})))
        .await;
    assert_eq!(retry.status, StatusCode::NOT_FOUND);
    assert_eq!(app.cart_count().await, 1);

    let update = app
        .call(Method::PATCH, "/api/cart/items/ghost", &[], Some(json!({"quantity": 2})))
        .await;
    assert_eq!(update.status, StatusCode::NOT_FOUND);
    assert!(update.headers.get("x-session-key").is_none());
    assert_eq!(app.cart_count().await, 1);
}

#[tokio::test]
async fn test_secondary_listings_honor_sort_by() {
    let app = setup().await;
    let mut ids = Vec::new();
    for (name, price) in [("Mid", "20.00"), ("Cheap", "5.00"), ("Dear", "90.00")] {
        ids.push(app.seed(name, name, price, 0).await.id);
    }
    let admin = [("x-user-id", "admin")];
    app.call(
        Method::POST,
        "/api/products/bulk-update",
        &admin,
        Some(json!({"product_ids": ids, "update_data": {"is_featured": true}})),
    )
    .await;

    let names = |reply: &Reply| -> Vec<String> {
        reply.body["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap().to_string())
            .collect()
    };
    let featured = app.get("/api/products/featured?sort_by=price").await;
    assert_eq!(names(&featured), ["Cheap", "Mid", "Dear"]);
    let out = app.get("/api/products/out-of-stock?sort_by=-price").await;
    assert_eq!(names(&out), ["Dear", "Mid", "Cheap"]);
    let search = app.get("/api/products/search?q=general&sort_by=name").await;
    assert_eq!(names(&search), ["Cheap", "Dear", "Mid"]);
}
