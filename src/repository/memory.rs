//! In-memory repositories.
//!
//! Every collection is a `Vec` behind a `tokio::sync::RwLock`, kept in
//! insertion order so "newest first" listings stay stable when timestamps tie.
//! Check-then-write sequences run under a single write lock.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    CouponRepository, OrderRepository, ProductRepository, RepositoryError, Result, ReviewRepository, StockLine,
    UserRepository,
};
use crate::domain::aggregates::{
    Address, Coupon, NewOrder, NewProduct, NewReview, NewUser, Order, OrderStatus, Product, ProductError,
    ProductPatch, ProductQuery, RatingSummary, Review, Role, User,
};
use crate::domain::value_objects::CouponCode;

fn newest_first<T: Clone>(items: impl DoubleEndedIterator<Item = T>, created_at: impl Fn(&T) -> chrono::DateTime<Utc>) -> Vec<T> {
    let mut out: Vec<T> = items.rev().collect();
    out.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    out
}

// =============================================================================
// Products
// =============================================================================

#[derive(Default)]
pub struct MemoryProductRepository {
    products: RwLock<Vec<Product>>,
}

#[async_trait]
impl ProductRepository for MemoryProductRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>> {
        Ok(self.products.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_legacy_id(&self, legacy_id: i64) -> Result<Option<Product>> {
        Ok(self.products.read().await.iter().find(|p| p.legacy_id == Some(legacy_id)).cloned())
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Product>> {
        Ok(self.products.read().await.iter().find(|p| p.title == title).cloned())
    }

    async fn find(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        let products = self.products.read().await;
        let mut found: Vec<Product> = products.iter().rev().filter(|p| query.matches(p)).cloned().collect();
        found.sort_by(|a, b| query.sort.compare(a, b));
        Ok(found)
    }

    async fn create(&self, product: NewProduct) -> Result<Product> {
        let product = product.into_product(Uuid::now_v7(), Utc::now());
        self.products.write().await.push(product.clone());
        Ok(product)
    }

    async fn update(&self, id: Uuid, patch: ProductPatch) -> Result<Option<Product>> {
        let mut products = self.products.write().await;
        let Some(product) = products.iter_mut().find(|p| p.id == id) else { return Ok(None) };
        product.apply_patch(patch);
        Ok(Some(product.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut products = self.products.write().await;
        let before = products.len();
        products.retain(|p| p.id != id);
        Ok(products.len() != before)
    }

    async fn replace_all(&self, new_products: Vec<NewProduct>) -> Result<(u64, u64)> {
        let now = Utc::now();
        let mut products = self.products.write().await;
        let removed = products.len() as u64;
        let inserted = new_products.len() as u64;
        products.clear();
        products.extend(new_products.into_iter().map(|p| p.into_product(Uuid::now_v7(), now)));
        Ok((removed, inserted))
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.products.read().await.len() as i64)
    }

    async fn reserve_stock(&self, lines: &[StockLine]) -> Result<()> {
        let mut products = self.products.write().await;
        // Apply to scratch copies first so a short line leaves the store untouched.
        let mut staged: HashMap<Uuid, Product> = HashMap::new();
        for line in lines {
            if !staged.contains_key(&line.product_id) {
                let Some(product) = products.iter().find(|p| p.id == line.product_id) else {
                    return Err(RepositoryError::InsufficientStock { product_id: line.product_id, available: 0 });
                };
                staged.insert(line.product_id, product.clone());
            }
            if let Some(product) = staged.get_mut(&line.product_id) {
                product.take_stock(line.qty).map_err(|ProductError::InsufficientStock { available }| {
                    RepositoryError::InsufficientStock { product_id: line.product_id, available }
                })?;
            }
        }
        for product in products.iter_mut() {
            if let Some(updated) = staged.remove(&product.id) {
                *product = updated;
            }
        }
        Ok(())
    }

    async fn release_stock(&self, lines: &[StockLine]) -> Result<()> {
        let mut products = self.products.write().await;
        for line in lines {
            if let Some(product) = products.iter_mut().find(|p| p.id == line.product_id) {
                product.restock(line.qty);
            }
        }
        Ok(())
    }

    async fn set_stock(&self, id: Uuid, qty: i32) -> Result<Option<Product>> {
        let mut products = self.products.write().await;
        let Some(product) = products.iter_mut().find(|p| p.id == id) else { return Ok(None) };
        product.set_stock(qty);
        Ok(Some(product.clone()))
    }

    async fn update_rating(&self, id: Uuid, rating: RatingSummary) -> Result<()> {
        if let Some(product) = self.products.write().await.iter_mut().find(|p| p.id == id) {
            product.set_rating(rating);
        }
        Ok(())
    }
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Default)]
pub struct MemoryOrderRepository {
    orders: RwLock<Vec<Order>>,
}

#[async_trait]
impl OrderRepository for MemoryOrderRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>> {
        Ok(self.orders.read().await.iter().find(|o| o.id == id).cloned())
    }

    async fn find_by_customer_email(&self, email: &str) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(newest_first(orders.iter().filter(|o| o.customer.email == email).cloned(), |o| o.created_at))
    }

    async fn find_all(&self) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(newest_first(orders.iter().cloned(), |o| o.created_at))
    }

    async fn create(&self, order: NewOrder) -> Result<Order> {
        let order = order.into_order(Uuid::now_v7(), Utc::now());
        self.orders.write().await.push(order.clone());
        Ok(order)
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Option<Order>> {
        let mut orders = self.orders.write().await;
        let Some(order) = orders.iter_mut().find(|o| o.id == id && o.status != OrderStatus::Cancelled) else {
            return Ok(None);
        };
        order.status = status;
        Ok(Some(order.clone()))
    }

    async fn compare_and_set_status(&self, id: Uuid, from: OrderStatus, to: OrderStatus) -> Result<Option<Order>> {
        let mut orders = self.orders.write().await;
        let Some(order) = orders.iter_mut().find(|o| o.id == id && o.status == from) else { return Ok(None) };
        order.status = to;
        Ok(Some(order.clone()))
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.orders.read().await.len() as i64)
    }

    async fn total_revenue(&self) -> Result<Decimal> {
        Ok(self.orders.read().await.iter().map(|o| o.total_amount).sum())
    }
}

// =============================================================================
// Reviews
// =============================================================================

#[derive(Default)]
pub struct MemoryReviewRepository {
    reviews: RwLock<Vec<Review>>,
}

#[async_trait]
impl ReviewRepository for MemoryReviewRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>> {
        Ok(self.reviews.read().await.iter().find(|r| r.id == id).cloned())
    }

    async fn find_by_user_and_product(&self, user_id: Uuid, product_id: Uuid) -> Result<Option<Review>> {
        let reviews = self.reviews.read().await;
        Ok(reviews.iter().find(|r| r.user_id == user_id && r.product_id == product_id).cloned())
    }

    async fn find_by_product(&self, product_id: Uuid) -> Result<Vec<Review>> {
        let reviews = self.reviews.read().await;
        Ok(newest_first(reviews.iter().filter(|r| r.product_id == product_id).cloned(), |r| r.created_at))
    }

    async fn create(&self, review: NewReview) -> Result<Review> {
        let mut reviews = self.reviews.write().await;
        if reviews.iter().any(|r| r.user_id == review.user_id && r.product_id == review.product_id) {
            return Err(RepositoryError::Conflict("review already exists".to_owned()));
        }
        let review = review.into_review(Uuid::now_v7(), Utc::now());
        reviews.push(review.clone());
        Ok(review)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut reviews = self.reviews.write().await;
        let before = reviews.len();
        reviews.retain(|r| r.id != id);
        Ok(reviews.len() != before)
    }
}

// =============================================================================
// Coupons
// =============================================================================

#[derive(Default)]
pub struct MemoryCouponRepository {
    coupons: RwLock<Vec<Coupon>>,
}

#[async_trait]
impl CouponRepository for MemoryCouponRepository {
    async fn find_by_name(&self, name: &CouponCode) -> Result<Option<Coupon>> {
        Ok(self.coupons.read().await.iter().find(|c| &c.name == name).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Coupon>> {
        let coupons = self.coupons.read().await;
        Ok(newest_first(coupons.iter().cloned(), |c| c.created_at))
    }

    async fn create(&self, coupon: Coupon) -> Result<Coupon> {
        let mut coupons = self.coupons.write().await;
        if coupons.iter().any(|c| c.name == coupon.name) {
            return Err(RepositoryError::Conflict("coupon name already exists".to_owned()));
        }
        coupons.push(coupon.clone());
        Ok(coupon)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut coupons = self.coupons.write().await;
        let before = coupons.len();
        coupons.retain(|c| c.id != id);
        Ok(coupons.len() != before)
    }
}

// =============================================================================
// Users
// =============================================================================

#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<Vec<User>>,
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.email == email).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        let user = user.into_user(Uuid::now_v7(), Utc::now());
        users.push(user.clone());
        Ok(user)
    }

    async fn update_profile(&self, id: Uuid, name: Option<String>, password_hash: Option<String>) -> Result<Option<User>> {
        let mut users = self.users.write().await;
        let Some(user) = users.iter_mut().find(|u| u.id == id) else { return Ok(None) };
        if let Some(name) = name { user.name = name; }
        if let Some(hash) = password_hash { user.password_hash = hash; }
        Ok(Some(user.clone()))
    }

    async fn replace_addresses(&self, id: Uuid, addresses: Vec<Address>) -> Result<Option<User>> {
        let mut users = self.users.write().await;
        let Some(user) = users.iter_mut().find(|u| u.id == id) else { return Ok(None) };
        user.addresses = addresses;
        Ok(Some(user.clone()))
    }

    async fn count_by_role(&self, role: Role) -> Result<i64> {
        Ok(self.users.read().await.iter().filter(|u| u.role == role).count() as i64)
    }
}
