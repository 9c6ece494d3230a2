//! Application services.
//!
//! Each service owns the repository handles it needs and speaks
//! [`ShopError`](crate::ShopError). [`Services`] bundles them for the HTTP
//! layer, which shares one instance behind an `Arc`.

pub mod auth;
pub mod catalog;
pub mod coupon;
pub mod inventory;
pub mod order;
pub mod review;
pub mod seed;
pub mod stats;
pub mod token;
pub mod user;

pub use auth::{AuthService, AuthSession, LoginRequest, RegisterRequest};
pub use catalog::CatalogService;
pub use coupon::CouponService;
pub use inventory::{Availability, InventoryService, StockLevel};
pub use order::OrderService;
pub use review::{ReviewRequest, ReviewService};
pub use seed::SeedService;
pub use stats::{DashboardStats, StatsService};
pub use token::TokenService;
pub use user::{ProfileUpdate, UserService};

use crate::domain::aggregates::Product;
use crate::domain::value_objects::ProductRef;
use crate::repository::{self, ProductRepository, Repositories};

pub struct Services {
    pub inventory: InventoryService,
    pub orders: OrderService,
    pub reviews: ReviewService,
    pub coupons: CouponService,
    pub auth: AuthService,
    pub users: UserService,
    pub catalog: CatalogService,
    pub seed: SeedService,
    pub stats: StatsService,
}

impl Services {
    pub fn new(repos: Repositories, tokens: TokenService) -> Self {
        let inventory = InventoryService::new(repos.products.clone());
        Self {
            orders: OrderService::new(repos.orders.clone(), inventory.clone()),
            inventory,
            reviews: ReviewService::new(repos.reviews.clone(), repos.products.clone()),
            coupons: CouponService::new(repos.coupons.clone()),
            auth: AuthService::new(repos.users.clone(), tokens),
            users: UserService::new(repos.users.clone()),
            catalog: CatalogService::new(repos.products.clone()),
            seed: SeedService::new(repos.products.clone()),
            stats: StatsService::new(repos.orders, repos.products, repos.users),
        }
    }
}

pub(crate) async fn lookup_product(
    products: &dyn ProductRepository,
    product: ProductRef,
) -> repository::Result<Option<Product>> {
    match product {
        ProductRef::Id(id) => products.find_by_id(id).await,
        ProductRef::Legacy(legacy_id) => products.find_by_legacy_id(legacy_id).await,
    }
}

pub(crate) const PRODUCT_NOT_FOUND: &str = "Product not found";
