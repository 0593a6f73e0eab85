use crate::error::{ApiError, ApiResult, JsonBody};
use crate::identity::{with_session, RequestIdentity};
use crate::state::AppState;
use crate::views::{CartItemEnvelope, CartResponse};
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::Value;
use shop_commerce::cart::parse_quantity;
use shop_commerce::cart::Cart;
use shop_commerce::{CartItemId, CommerceError, ProductId};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart))
        .route("/add", post(add_item))
        .route("/items/{item_id}", patch(update_item).delete(remove_item))
        .route("/clear", post(clear_cart))
}

/// GET /cart
#[tracing::instrument(name = "GET /cart", skip_all)]
async fn get_cart(State(state): State<AppState>, identity: RequestIdentity) -> ApiResult<Response> {
    let resolved = state.carts.resolve(&identity.cart_identity()).await?;
    let details = state.carts.details(&resolved.cart).await?;
    let body = CartResponse::new(&details)?;
    Ok(with_session(resolved.allocated_session, Json(body)))
}

/// POST /cart/add
#[tracing::instrument(name = "POST /cart/add", skip_all)]
async fn add_item(
    State(state): State<AppState>,
    identity: RequestIdentity,
    JsonBody(body): JsonBody<Value>,
) -> ApiResult<Response> {
    let product_id = product_ref(&body)?;
    let quantity = parse_quantity(body.get("quantity"))?;

    let (resolved, line) = state
        .carts
        .add_to_cart(&identity.cart_identity(), &product_id, quantity)
        .await?;
    Ok(with_session(
        resolved.allocated_session,
        Json(CartItemEnvelope::item(&line)),
    ))
}

/// PATCH /cart/items/{item_id}
#[tracing::instrument(name = "PATCH /cart/items", skip(state, identity, body))]
async fn update_item(
    State(state): State<AppState>,
    identity: RequestIdentity,
    Path(item_id): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> ApiResult<Response> {
    let quantity = parse_quantity(body.get("quantity"))?;
    let item_id = CartItemId::new(item_id);
    let cart = existing_cart(&state, &identity, &item_id).await?;
    let line = state.carts.update_item(&cart, &item_id, quantity).await?;
    Ok(Json(CartItemEnvelope::item(&line)).into_response())
}

/// DELETE /cart/items/{item_id}
#[tracing::instrument(name = "DELETE /cart/items", skip(state, identity))]
async fn remove_item(
    State(state): State<AppState>,
    identity: RequestIdentity,
    Path(item_id): Path<String>,
) -> ApiResult<Response> {
    let item_id = CartItemId::new(item_id);
    let cart = existing_cart(&state, &identity, &item_id).await?;
    state.carts.remove_item(&cart, &item_id).await?;
    Ok(Json(CartItemEnvelope::ok()).into_response())
}

/// POST /cart/clear
///
/// A caller without a cart has nothing to clear; no cart is created.
#[tracing::instrument(name = "POST /cart/clear", skip_all)]
async fn clear_cart(State(state): State<AppState>, identity: RequestIdentity) -> ApiResult<Response> {
    if let Some(cart) = state.carts.find(&identity.cart_identity()).await? {
        state.carts.clear(&cart).await?;
    }
    Ok(Json(CartItemEnvelope::ok()).into_response())
}

/// The caller's cart for an item operation. No cart means the item can't be
/// in it.
async fn existing_cart(
    state: &AppState,
    identity: &RequestIdentity,
    item_id: &CartItemId,
) -> ApiResult<Cart> {
    state
        .carts
        .find(&identity.cart_identity())
        .await?
        .ok_or_else(|| CommerceError::ItemNotInCart(item_id.to_string()).into())
}

/// The `product` field: an id string, or a number some clients send.
fn product_ref(body: &Value) -> ApiResult<ProductId> {
    match body.get("product") {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(ProductId::new(s.trim())),
        Some(Value::Number(n)) => Ok(ProductId::new(n.to_string())),
        _ => Err(ApiError::bad_request("product is required")),
    }
}
