use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::extract::{AdminUser, JsonBody};
use super::{message, parse_id, ApiError, AppState};
use crate::domain::aggregates::{Coupon, CouponApplication, NewCoupon};

#[derive(Debug, Deserialize)]
pub(super) struct ApplyRequest {
    name: String,
}

pub(super) async fn list(State(state): State<AppState>, AdminUser(_): AdminUser) -> Result<Json<Vec<Coupon>>, ApiError> {
    Ok(Json(state.services.coupons.list_coupons().await?))
}

pub(super) async fn create(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    JsonBody(coupon): JsonBody<NewCoupon>,
) -> Result<(StatusCode, Json<Coupon>), ApiError> {
    let coupon = state.services.coupons.create_coupon(coupon).await?;
    Ok((StatusCode::CREATED, Json(coupon)))
}

pub(super) async fn remove(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.services.coupons.delete_coupon(parse_id(&id, "Coupon not found")?).await?;
    Ok(message("Coupon deleted"))
}

pub(super) async fn apply(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ApplyRequest>,
) -> Result<Json<CouponApplication>, ApiError> {
    Ok(Json(state.services.coupons.apply_coupon(&request.name).await?))
}
