use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::extract::{CurrentUser, JsonBody};
use super::{message, parse_id, parse_product_ref, ApiError, AppState};
use crate::domain::aggregates::Review;
use crate::services::ReviewRequest;

pub(super) async fn list(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Vec<Review>>, ApiError> {
    Ok(Json(state.services.reviews.get_reviews(parse_product_ref(&id)?).await?))
}

pub(super) async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<ReviewRequest>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    let review = state.services.reviews.add_review(&user, parse_product_ref(&id)?, request).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub(super) async fn remove(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let review_id = parse_id(&id, "Review not found")?;
    state.services.reviews.delete_review(review_id, user.id).await?;
    Ok(message("Review removed"))
}
