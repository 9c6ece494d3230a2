use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::extract::{AdminUser, CurrentUser, JsonBody};
use super::{parse_id, ApiError, AppState};
use crate::domain::aggregates::{NewOrder, Order};
use crate::ShopError;

const ORDER_NOT_FOUND: &str = "order not found";

#[derive(Debug, Deserialize)]
pub(super) struct StatusUpdate {
    status: String,
}

/// Guest checkout is allowed; no token required.
pub(super) async fn create(
    State(state): State<AppState>,
    JsonBody(order): JsonBody<NewOrder>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order = state.services.orders.create_order(order).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub(super) async fn list_all(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.services.orders.get_all_orders().await?))
}

pub(super) async fn mine(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.services.orders.get_orders_by_user_email(&user.email).await?))
}

/// Customers see their own orders; admins see any.
pub(super) async fn get(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order = state.services.orders.get_order_by_id(parse_id(&id, ORDER_NOT_FOUND)?).await?;
    if !user.is_admin() && order.customer.email != user.email {
        return Err(ShopError::Forbidden("Not authorized to view this order".to_string()).into());
    }
    Ok(Json(order))
}

pub(super) async fn update_status(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
    JsonBody(update): JsonBody<StatusUpdate>,
) -> Result<Json<Order>, ApiError> {
    let id = parse_id(&id, ORDER_NOT_FOUND)?;
    Ok(Json(state.services.orders.update_status(id, &update.status).await?))
}

pub(super) async fn cancel(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.services.orders.cancel_order(parse_id(&id, ORDER_NOT_FOUND)?).await?))
}
