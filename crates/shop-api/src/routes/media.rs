use crate::error::{ApiResult, JsonBody};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;
use shop_commerce::prelude::*;

/// Image and attribute routes, mounted under `/products`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/{id}/images", get(list_images).post(add_image))
        .route("/{id}/images/primary", get(primary_image).post(set_primary))
        .route("/images/{image_id}", delete(delete_image))
        .route("/{id}/attributes", get(list_attributes).post(set_attribute))
        .route("/attributes/{attribute_id}", delete(delete_attribute))
}

#[derive(Debug, Deserialize)]
struct NewImage {
    #[serde(alias = "image")]
    url: String,
    #[serde(default)]
    alt_text: String,
    #[serde(default)]
    is_primary: bool,
}

#[derive(Debug, Deserialize)]
struct NewAttribute {
    name: String,
    #[serde(default)]
    value: String,
}

async fn list_images(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Vec<ProductImage>>> {
    Ok(Json(state.catalog.list_images(&ProductId::new(id)).await?))
}

/// POST /products/{id}/images
#[tracing::instrument(name = "POST /products/{id}/images", skip(state, input))]
async fn add_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<NewImage>,
) -> ApiResult<(StatusCode, Json<ProductImage>)> {
    let image = state
        .catalog
        .add_image(&ProductId::new(id), &input.url, &input.alt_text, input.is_primary)
        .await?;
    Ok((StatusCode::CREATED, Json(image)))
}

async fn delete_image(State(state): State<AppState>, Path(image_id): Path<String>) -> ApiResult<StatusCode> {
    state.catalog.delete_image(&ImageId::new(image_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn primary_image(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<ProductImage>> {
    Ok(Json(state.catalog.primary_image(&ProductId::new(id)).await?))
}

/// POST /products/{id}/images/primary
#[tracing::instrument(name = "POST /products/{id}/images/primary", skip(state, body))]
async fn set_primary(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> ApiResult<Json<ProductImage>> {
    let image_id = body
        .get("image_id")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(ImageId::new);
    let image = state
        .catalog
        .set_primary_image(&ProductId::new(id), image_id.as_ref())
        .await?;
    Ok(Json(image))
}

async fn list_attributes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ProductAttribute>>> {
    Ok(Json(state.catalog.list_attributes(&ProductId::new(id)).await?))
}

/// POST /products/{id}/attributes
#[tracing::instrument(name = "POST /products/{id}/attributes", skip(state, input))]
async fn set_attribute(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<NewAttribute>,
) -> ApiResult<(StatusCode, Json<ProductAttribute>)> {
    let attribute = state
        .catalog
        .set_attribute(&ProductId::new(id), &input.name, &input.value)
        .await?;
    Ok((StatusCode::CREATED, Json(attribute)))
}

async fn delete_attribute(
    State(state): State<AppState>,
    Path(attribute_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.catalog.delete_attribute(&AttributeId::new(attribute_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
