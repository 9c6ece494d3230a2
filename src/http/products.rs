use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::extract::{AdminUser, JsonBody, QueryParams};
use super::{message, parse_product_ref, ApiError, AppState};
use crate::domain::aggregates::{NewProduct, Product, ProductPatch, ProductQuery, SortStrategy};
use crate::services::StockLevel;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ListParams {
    category: Option<String>,
    keyword: Option<String>,
    min_price: Option<Decimal>,
    max_price: Option<Decimal>,
    sort: Option<String>,
}

impl From<ListParams> for ProductQuery {
    fn from(p: ListParams) -> Self {
        Self {
            category: p.category,
            keyword: p.keyword,
            min_price: p.min_price,
            max_price: p.max_price,
            sort: p.sort.as_deref().map(SortStrategy::from_key).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct StockUpdate {
    count_in_stock: i32,
}

pub(super) async fn list(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<ListParams>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let query = ProductQuery::from(params);
    Ok(Json(state.services.catalog.list_products(&query).await?))
}

pub(super) async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Product>, ApiError> {
    Ok(Json(state.services.catalog.get_product(parse_product_ref(&id)?).await?))
}

pub(super) async fn create(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    JsonBody(product): JsonBody<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product = state.services.catalog.create_product(product).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub(super) async fn update(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<ProductPatch>,
) -> Result<Json<Product>, ApiError> {
    Ok(Json(state.services.catalog.update_product(parse_product_ref(&id)?, patch).await?))
}

pub(super) async fn remove(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.services.catalog.delete_product(parse_product_ref(&id)?).await?;
    Ok(message("Product deleted"))
}

pub(super) async fn seed(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let count = state.services.seed.seed_products().await?;
    Ok(Json(serde_json::json!({ "message": "Products seeded successfully", "count": count })))
}

pub(super) async fn stock_level(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StockLevel>, ApiError> {
    Ok(Json(state.services.inventory.get_stock_level(parse_product_ref(&id)?).await?))
}

pub(super) async fn update_stock(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
    JsonBody(update): JsonBody<StockUpdate>,
) -> Result<Json<StockLevel>, ApiError> {
    let level = state.services.inventory.update_stock(parse_product_ref(&id)?, update.count_in_stock).await?;
    Ok(Json(level))
}
