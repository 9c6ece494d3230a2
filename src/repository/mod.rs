//! Persistence for the five storefront collections.
//!
//! Each collection sits behind an `async_trait` so services can run against
//! either backend:
//!
//! - [`postgres`] - `sqlx` over PostgreSQL; embedded documents live in JSONB
//!   columns
//! - [`memory`] - maps behind `tokio::sync::RwLock`, for tests and local runs
//!
//! Backends must apply [`ProductRepository::reserve_stock`] all-or-nothing.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::{
    Address, Coupon, NewOrder, NewProduct, NewReview, NewUser, Order, OrderStatus, Product, ProductPatch,
    ProductQuery, RatingSummary, Review, Role, User,
};
use crate::domain::value_objects::CouponCode;

pub mod memory;
pub mod postgres;

/// Errors surfaced by any repository backend.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Unique constraint violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A conditional stock decrement found too little stock.
    #[error("insufficient stock for product {product_id} (available: {available})")]
    InsufficientStock { product_id: Uuid, available: i32 },

    /// Stored data could not be mapped back into the domain.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// One product's share of a stock adjustment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StockLine {
    pub product_id: Uuid,
    pub qty: i32,
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>>;
    async fn find_by_legacy_id(&self, legacy_id: i64) -> Result<Option<Product>>;
    /// Exact title match.
    async fn find_by_title(&self, title: &str) -> Result<Option<Product>>;
    async fn find(&self, query: &ProductQuery) -> Result<Vec<Product>>;
    async fn create(&self, product: NewProduct) -> Result<Product>;
    async fn update(&self, id: Uuid, patch: ProductPatch) -> Result<Option<Product>>;
    /// Reviews of a removed product are kept, here and in [`Self::replace_all`].
    async fn delete(&self, id: Uuid) -> Result<bool>;
    /// Swaps the whole catalog for `products` in one step: if the insert
    /// fails the old catalog stays. Returns `(removed, inserted)`.
    async fn replace_all(&self, products: Vec<NewProduct>) -> Result<(u64, u64)>;
    async fn count(&self) -> Result<i64>;
    /// Decrements every line or none. Fails with
    /// [`RepositoryError::InsufficientStock`] naming the first short line.
    async fn reserve_stock(&self, lines: &[StockLine]) -> Result<()>;
    /// Increments stock per line; lines for missing products are skipped.
    async fn release_stock(&self, lines: &[StockLine]) -> Result<()>;
    async fn set_stock(&self, id: Uuid, qty: i32) -> Result<Option<Product>>;
    async fn update_rating(&self, id: Uuid, rating: RatingSummary) -> Result<()>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>>;
    /// Newest first.
    async fn find_by_customer_email(&self, email: &str) -> Result<Vec<Order>>;
    /// Newest first.
    async fn find_all(&self) -> Result<Vec<Order>>;
    async fn create(&self, order: NewOrder) -> Result<Order>;
    /// Cancelled orders are left untouched and come back as `None`, the same
    /// as a missing order.
    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Option<Order>>;
    /// Moves the order from `from` to `to` only if its status is still `from`;
    /// returns the order when this call made the change.
    async fn compare_and_set_status(&self, id: Uuid, from: OrderStatus, to: OrderStatus) -> Result<Option<Order>>;
    async fn count(&self) -> Result<i64>;
    /// Sum of all order totals, zero when there are none.
    async fn total_revenue(&self) -> Result<Decimal>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>>;
    async fn find_by_user_and_product(&self, user_id: Uuid, product_id: Uuid) -> Result<Option<Review>>;
    /// Newest first.
    async fn find_by_product(&self, product_id: Uuid) -> Result<Vec<Review>>;
    /// Fails with [`RepositoryError::Conflict`] if the user already reviewed
    /// the product.
    async fn create(&self, review: NewReview) -> Result<Review>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait CouponRepository: Send + Sync {
    async fn find_by_name(&self, name: &CouponCode) -> Result<Option<Coupon>>;
    /// Newest first.
    async fn find_all(&self) -> Result<Vec<Coupon>>;
    /// Fails with [`RepositoryError::Conflict`] on a duplicate name.
    async fn create(&self, coupon: Coupon) -> Result<Coupon>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Fails with [`RepositoryError::Conflict`] on a duplicate email.
    async fn create(&self, user: NewUser) -> Result<User>;
    async fn update_profile(&self, id: Uuid, name: Option<String>, password_hash: Option<String>) -> Result<Option<User>>;
    async fn replace_addresses(&self, id: Uuid, addresses: Vec<Address>) -> Result<Option<User>>;
    async fn count_by_role(&self, role: Role) -> Result<i64>;
}

/// Handles to every collection, wired once at startup.
#[derive(Clone)]
pub struct Repositories {
    pub products: Arc<dyn ProductRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
    pub coupons: Arc<dyn CouponRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Repositories {
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            products: Arc::new(postgres::PgProductRepository::new(pool.clone())),
            orders: Arc::new(postgres::PgOrderRepository::new(pool.clone())),
            reviews: Arc::new(postgres::PgReviewRepository::new(pool.clone())),
            coupons: Arc::new(postgres::PgCouponRepository::new(pool.clone())),
            users: Arc::new(postgres::PgUserRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            products: Arc::new(memory::MemoryProductRepository::default()),
            orders: Arc::new(memory::MemoryOrderRepository::default()),
            reviews: Arc::new(memory::MemoryReviewRepository::default()),
            coupons: Arc::new(memory::MemoryCouponRepository::default()),
            users: Arc::new(memory::MemoryUserRepository::default()),
        }
    }
}
