use crate::error::{ApiResult, JsonBody};
use crate::identity::RequestIdentity;
use crate::state::AppState;
use crate::views::ReviewCreated;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use shop_commerce::prelude::*;

/// Review routes, mounted under `/products`.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}/reviews", get(list_reviews).post(create_review))
        .route("/{id}/reviews/stats", get(review_stats))
}

/// Routes on a single review, mounted under `/reviews`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/{review_id}", patch(update_review).delete(delete_review))
}

async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ProductReview>>> {
    Ok(Json(state.reviews.list(&ProductId::new(id)).await?))
}

/// POST /products/{id}/reviews
#[tracing::instrument(name = "POST /products/{id}/reviews", skip(state, identity, input))]
async fn create_review(
    State(state): State<AppState>,
    identity: RequestIdentity,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<NewReview>,
) -> ApiResult<(StatusCode, Json<ReviewCreated>)> {
    let user_id = identity.require_user()?;
    let (review, product_rating) = state
        .reviews
        .create(&ProductId::new(id), Some(user_id), input)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ReviewCreated {
            review,
            product_rating,
        }),
    ))
}

async fn review_stats(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<ReviewStats>> {
    Ok(Json(state.reviews.stats(&ProductId::new(id)).await?))
}

/// PATCH /reviews/{review_id}
#[tracing::instrument(name = "PATCH /reviews/{review_id}", skip(state, identity, edit))]
async fn update_review(
    State(state): State<AppState>,
    identity: RequestIdentity,
    Path(review_id): Path<String>,
    JsonBody(edit): JsonBody<ReviewEdit>,
) -> ApiResult<Json<ProductReview>> {
    let user_id = identity.require_user()?;
    let review = state
        .reviews
        .update(&ReviewId::new(review_id), Some(user_id), &edit)
        .await?;
    Ok(Json(review))
}

/// DELETE /reviews/{review_id}
#[tracing::instrument(name = "DELETE /reviews/{review_id}", skip(state, identity))]
async fn delete_review(
    State(state): State<AppState>,
    identity: RequestIdentity,
    Path(review_id): Path<String>,
) -> ApiResult<StatusCode> {
    let user_id = identity.require_user()?;
    state
        .reviews
        .delete(&ReviewId::new(review_id), Some(user_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
