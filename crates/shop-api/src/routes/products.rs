use crate::error::{ApiResult, JsonBody};
use crate::identity::RequestIdentity;
use crate::routes::{media, reviews};
use crate::state::AppState;
use crate::views::{Page, ProductDetail, ProductResponse, StockResponse, TrendingResponse};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shop_commerce::catalog::parse_stock;
use shop_commerce::prelude::*;

type Pairs = Query<Vec<(String, String)>>;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/filter", get(filter_products))
        .route("/search", get(search_products))
        .route("/trending", get(trending))
        .route("/on-sale", get(on_sale))
        .route("/featured", get(featured))
        .route("/low-stock", get(low_stock))
        .route("/out-of-stock", get(out_of_stock))
        .route("/by-sku", post(by_sku))
        .route("/bulk-update", post(bulk_update))
        .route("/bulk-delete", post(bulk_delete))
        .route("/slug/{slug}", get(get_by_slug))
        .route(
            "/{id}",
            get(get_product).patch(update_product).delete(delete_product),
        )
        .route("/{id}/stock", get(get_stock).post(set_stock))
        .route("/{id}/view", post(track_view))
        .route("/{id}/analytics", get(analytics))
        .merge(media::routes())
        .merge(reviews::product_routes())
}

/// Attach list images to a set of products.
pub(crate) async fn render(state: &AppState, products: &[Product]) -> ApiResult<Vec<ProductResponse>> {
    let ids: Vec<ProductId> = products.iter().map(|p| p.id.clone()).collect();
    let images = state.catalog.images_for(&ids).await?;
    Ok(ProductResponse::many(products, &images))
}

pub(crate) async fn render_page(
    state: &AppState,
    results: SearchResults<Product>,
) -> ApiResult<Json<Page<ProductResponse>>> {
    let items = render(state, &results.items).await?;
    Ok(Json(Page::from(SearchResults::new(items, results.pagination))))
}

async fn render_detail(state: &AppState, product: &Product) -> ApiResult<ProductDetail> {
    let images = state.catalog.list_images(&product.id).await?;
    let attributes = state.catalog.list_attributes(&product.id).await?;
    Ok(ProductDetail::new(product, images, attributes))
}

// ---- listings ----

/// GET /products
#[tracing::instrument(name = "GET /products", skip_all)]
async fn list_products(
    State(state): State<AppState>,
    Query(pairs): Pairs,
) -> ApiResult<Json<Page<ProductResponse>>> {
    let query = QueryParams::new(&pairs).product_query(state.settings())?;
    let results = state.catalog.list_products(&query).await?;
    render_page(&state, results).await
}

/// GET /products/filter
///
/// Same engine as the plain listing; this route exists for clients that use
/// the multi-value `categories`/`brands` parameters.
#[tracing::instrument(name = "GET /products/filter", skip_all)]
async fn filter_products(
    State(state): State<AppState>,
    Query(pairs): Pairs,
) -> ApiResult<Json<Page<ProductResponse>>> {
    let query = QueryParams::new(&pairs).product_query(state.settings())?;
    let results = state.catalog.list_products(&query).await?;
    render_page(&state, results).await
}

/// GET /products/search?q=
#[tracing::instrument(name = "GET /products/search", skip_all)]
async fn search_products(
    State(state): State<AppState>,
    Query(pairs): Pairs,
) -> ApiResult<Json<Page<ProductResponse>>> {
    let params = QueryParams::new(&pairs);
    let text = params.get("q").or_else(|| params.get("search")).unwrap_or("");
    let (page, page_size) = params.page(state.settings())?;
    let results = state.catalog.search(text, params.sort(), page, page_size).await?;
    render_page(&state, results).await
}

/// GET /products/trending
#[tracing::instrument(name = "GET /products/trending", skip_all)]
async fn trending(State(state): State<AppState>) -> ApiResult<Json<Vec<TrendingResponse>>> {
    let ranked = state.analytics.trending().await?;
    let ids: Vec<ProductId> = ranked.iter().map(|t| t.product.id.clone()).collect();
    let images = state.catalog.images_for(&ids).await?;
    let body = ranked
        .iter()
        .map(|t| TrendingResponse {
            product: ProductResponse::new(
                &t.product,
                images.get(&t.product.id).map(Vec::as_slice).unwrap_or(&[]),
            ),
            recent_views: t.recent_views,
        })
        .collect();
    Ok(Json(body))
}

/// GET /products/on-sale
async fn on_sale(State(state): State<AppState>, Query(pairs): Pairs) -> ApiResult<Json<Page<ProductResponse>>> {
    let params = QueryParams::new(&pairs);
    let (page, page_size) = params.page(state.settings())?;
    let results = state.catalog.on_sale(params.sort(), page, page_size).await?;
    render_page(&state, results).await
}

/// GET /products/featured
async fn featured(State(state): State<AppState>, Query(pairs): Pairs) -> ApiResult<Json<Page<ProductResponse>>> {
    let params = QueryParams::new(&pairs);
    let (page, page_size) = params.page(state.settings())?;
    let results = state.catalog.featured(params.sort(), page, page_size).await?;
    render_page(&state, results).await
}

/// GET /products/low-stock?threshold=
async fn low_stock(State(state): State<AppState>, Query(pairs): Pairs) -> ApiResult<Json<Page<ProductResponse>>> {
    let params = QueryParams::new(&pairs);
    let threshold = params.get_i64("threshold")?;
    let (page, page_size) = params.page(state.settings())?;
    let results = state
        .catalog
        .low_stock(threshold, params.sort(), page, page_size)
        .await?;
    render_page(&state, results).await
}

/// GET /products/out-of-stock
async fn out_of_stock(
    State(state): State<AppState>,
    Query(pairs): Pairs,
) -> ApiResult<Json<Page<ProductResponse>>> {
    let params = QueryParams::new(&pairs);
    let (page, page_size) = params.page(state.settings())?;
    let results = state.catalog.out_of_stock(params.sort(), page, page_size).await?;
    render_page(&state, results).await
}

/// POST /products/by-sku
#[tracing::instrument(name = "POST /products/by-sku", skip_all)]
async fn by_sku(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> ApiResult<Json<Vec<ProductResponse>>> {
    let skus = body
        .get("skus")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    let products = state.catalog.products_by_sku(skus).await?;
    Ok(Json(render(&state, &products).await?))
}

// ---- single product ----

/// POST /products
#[tracing::instrument(name = "POST /products", skip_all)]
async fn create_product(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<NewProduct>,
) -> ApiResult<(StatusCode, Json<ProductDetail>)> {
    let product = state.catalog.create_product(input).await?;
    Ok((StatusCode::CREATED, Json(render_detail(&state, &product).await?)))
}

/// GET /products/{id}
#[tracing::instrument(name = "GET /products/{id}", skip(state, identity))]
async fn get_product(
    State(state): State<AppState>,
    identity: RequestIdentity,
    Path(id): Path<String>,
) -> ApiResult<Json<ProductDetail>> {
    let id = ProductId::new(id);
    state.catalog.get_product(&id).await?;
    record_view(&state, &identity, &id).await?;
    let product = state.catalog.get_product(&id).await?;
    Ok(Json(render_detail(&state, &product).await?))
}

/// GET /products/slug/{slug}
#[tracing::instrument(name = "GET /products/slug/{slug}", skip(state, identity))]
async fn get_by_slug(
    State(state): State<AppState>,
    identity: RequestIdentity,
    Path(slug): Path<String>,
) -> ApiResult<Json<ProductDetail>> {
    let product = state.catalog.get_product_by_slug(&slug).await?;
    record_view(&state, &identity, &product.id).await?;
    let product = state.catalog.get_product(&product.id).await?;
    Ok(Json(render_detail(&state, &product).await?))
}

/// PATCH /products/{id}
#[tracing::instrument(name = "PATCH /products/{id}", skip(state, update))]
async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(update): JsonBody<ProductUpdate>,
) -> ApiResult<Json<ProductDetail>> {
    let patch = update.into_patch()?;
    let product = state.catalog.update_product(&ProductId::new(id), patch).await?;
    Ok(Json(render_detail(&state, &product).await?))
}

/// DELETE /products/{id}
#[tracing::instrument(name = "DELETE /products/{id}", skip(state))]
async fn delete_product(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.catalog.delete_product(&ProductId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn record_view(state: &AppState, identity: &RequestIdentity, id: &ProductId) -> ApiResult<bool> {
    Ok(state
        .analytics
        .record_view(id, identity.user_id.as_ref(), identity.client_ip.as_deref())
        .await?)
}

/// POST /products/{id}/view
#[tracing::instrument(name = "POST /products/{id}/view", skip(state, identity))]
async fn track_view(
    State(state): State<AppState>,
    identity: RequestIdentity,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    record_view(&state, &identity, &ProductId::new(id)).await?;
    Ok(Json(json!({ "status": "view tracked" })))
}

/// GET /products/{id}/analytics
async fn analytics(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<ProductAnalytics>> {
    let analytics = state.analytics.product_analytics(&ProductId::new(id)).await?;
    Ok(Json(analytics))
}

// ---- inventory ----

/// GET /products/{id}/stock
async fn get_stock(
    State(state): State<AppState>,
    identity: RequestIdentity,
    Path(id): Path<String>,
) -> ApiResult<Json<StockResponse>> {
    identity.require_user()?;
    let product = state.catalog.get_any_product(&ProductId::new(id)).await?;
    Ok(Json(StockResponse::new(&product)))
}

/// POST /products/{id}/stock
#[tracing::instrument(name = "POST /products/{id}/stock", skip(state, identity, body))]
async fn set_stock(
    State(state): State<AppState>,
    identity: RequestIdentity,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> ApiResult<Json<StockResponse>> {
    identity.require_user()?;
    let stock = parse_stock(body.get("stock"))?;
    let product = state.catalog.set_stock(&ProductId::new(id), stock).await?;
    Ok(Json(StockResponse {
        message: Some("Stock updated successfully"),
        ..StockResponse::new(&product)
    }))
}

#[derive(Debug, Deserialize)]
struct BulkUpdateRequest {
    #[serde(default)]
    product_ids: Vec<ProductId>,
    #[serde(default)]
    update_data: BulkUpdate,
}

#[derive(Debug, Deserialize)]
struct BulkDeleteRequest {
    #[serde(default)]
    product_ids: Vec<ProductId>,
}

#[derive(Debug, Serialize)]
struct BulkUpdated {
    updated_count: u64,
    message: String,
}

#[derive(Debug, Serialize)]
struct BulkDeleted {
    deleted_count: u64,
    message: String,
}

/// POST /products/bulk-update
#[tracing::instrument(name = "POST /products/bulk-update", skip_all)]
async fn bulk_update(
    State(state): State<AppState>,
    identity: RequestIdentity,
    JsonBody(body): JsonBody<BulkUpdateRequest>,
) -> ApiResult<Json<BulkUpdated>> {
    identity.require_user()?;
    let count = state.catalog.bulk_update(&body.product_ids, body.update_data).await?;
    Ok(Json(BulkUpdated {
        updated_count: count,
        message: format!("{} products updated successfully", count),
    }))
}

/// POST /products/bulk-delete
#[tracing::instrument(name = "POST /products/bulk-delete", skip_all)]
async fn bulk_delete(
    State(state): State<AppState>,
    identity: RequestIdentity,
    JsonBody(body): JsonBody<BulkDeleteRequest>,
) -> ApiResult<Json<BulkDeleted>> {
    identity.require_user()?;
    let count = state.catalog.bulk_delete(&body.product_ids).await?;
    Ok(Json(BulkDeleted {
        deleted_count: count,
        message: format!("{} products deleted successfully", count),
    }))
}
