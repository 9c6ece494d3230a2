//! Aggregates module
pub mod coupon;
pub mod order;
pub mod product;
pub mod review;
pub mod user;

pub use coupon::{Coupon, CouponApplication, NewCoupon};
pub use order::{CustomerSnapshot, LineItem, NewOrder, Order, OrderStatus};
pub use product::{
    Fabric, Model3d, NewProduct, Product, ProductError, ProductPatch, ProductQuery, RatingSummary, SortStrategy,
};
pub use review::{NewReview, Review};
pub use user::{hash_password, Address, NewAddress, NewUser, Role, User, UserProfile};
