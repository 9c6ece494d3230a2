//! HTTP surface: axum router, shared state and handlers.

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::domain::value_objects::ProductRef;
use crate::services::Services;
use crate::ShopError;

pub mod error;
pub mod extract;

mod auth;
mod coupons;
mod orders;
mod products;
mod reviews;
mod stats;
mod users;


pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub services: Arc<Services>,
}

impl AppState {
    pub fn new(services: Services) -> Self {
        Self { services: Arc::new(services) }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "casa-commerce"})) }))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/users/profile", put(users::update_profile))
        .route("/api/users/address", post(users::add_address))
        .route("/api/users/address/:id", delete(users::delete_address))
        .route("/api/products", get(products::list).post(products::create))
        .route("/api/products/seed", post(products::seed))
        .route("/api/products/:id", get(products::get).put(products::update).delete(products::remove))
        .route("/api/products/:id/stock", get(products::stock_level).put(products::update_stock))
        .route("/api/products/:id/reviews", get(reviews::list).post(reviews::create))
        .route("/api/reviews/:id", delete(reviews::remove))
        .route("/api/orders", get(orders::list_all).post(orders::create))
        .route("/api/orders/mine", get(orders::mine))
        .route("/api/orders/:id", get(orders::get))
        .route("/api/orders/:id/status", put(orders::update_status))
        .route("/api/orders/:id/cancel", post(orders::cancel))
        .route("/api/coupons", get(coupons::list).post(coupons::create))
        .route("/api/coupons/apply", post(coupons::apply))
        .route("/api/coupons/:id", delete(coupons::remove))
        .route("/api/stats", get(stats::dashboard))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// A malformed id is reported as `NotFound`.
fn parse_id(raw: &str, not_found: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ShopError::NotFound(not_found.to_string()).into())
}

fn parse_product_ref(raw: &str) -> Result<ProductRef, ApiError> {
    raw.parse::<ProductRef>().map_err(|_| ShopError::NotFound(crate::services::PRODUCT_NOT_FOUND.to_string()).into())
}

fn message(text: impl Into<String>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": text.into() }))
}
