//! Brand and category endpoints.

use crate::error::{ApiResult, JsonBody};
use crate::routes::products::render_page;
use crate::state::AppState;
use crate::views::{Page, ProductResponse};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use shop_commerce::prelude::*;

pub fn brand_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_brands).post(create_brand))
        .route("/slug/{slug}", get(get_brand_by_slug))
        .route("/{id}", get(get_brand))
        .route("/{id}/products", get(brand_products))
}

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/slug/{slug}", get(get_category_by_slug))
        .route("/{id}", get(get_category))
}

async fn list_brands(State(state): State<AppState>) -> ApiResult<Json<Vec<Brand>>> {
    Ok(Json(state.catalog.list_brands().await?))
}

/// POST /brands
#[tracing::instrument(name = "POST /brands", skip_all)]
async fn create_brand(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<NewBrand>,
) -> ApiResult<(StatusCode, Json<Brand>)> {
    Ok((StatusCode::CREATED, Json(state.catalog.create_brand(input).await?)))
}

async fn get_brand(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Brand>> {
    Ok(Json(state.catalog.get_brand(&BrandId::new(id)).await?))
}

async fn get_brand_by_slug(State(state): State<AppState>, Path(slug): Path<String>) -> ApiResult<Json<Brand>> {
    Ok(Json(state.catalog.get_brand_by_slug(&slug).await?))
}

/// GET /brands/{id}/products
async fn brand_products(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<Json<Page<ProductResponse>>> {
    let params = QueryParams::new(&pairs);
    let (page, page_size) = params.page(state.settings())?;
    let results = state
        .catalog
        .brand_products(&BrandId::new(id), params.sort(), page, page_size)
        .await?;
    render_page(&state, results).await
}

async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.catalog.list_categories().await?))
}

/// POST /categories
#[tracing::instrument(name = "POST /categories", skip_all)]
async fn create_category(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<NewCategory>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    Ok((StatusCode::CREATED, Json(state.catalog.create_category(input).await?)))
}

async fn get_category(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Category>> {
    Ok(Json(state.catalog.get_category(&CategoryId::new(id)).await?))
}

async fn get_category_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Category>> {
    Ok(Json(state.catalog.get_category_by_slug(&slug).await?))
}
