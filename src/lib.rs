//! Casa Commerce
//!
//! Backend for a furniture storefront, served as a JSON API.
//!
//! ## Features
//! - Product catalog with filtering and sort strategies
//! - Checkout through orders with atomic inventory reservation
//! - Coupons with expiry
//! - Product reviews with aggregate ratings
//! - Customer accounts with address book
//! - Admin dashboard statistics

pub mod config;
pub mod domain;
pub mod http;
pub mod repository;
pub mod services;

#[cfg(test)]
pub(crate) mod test_utils;

use thiserror::Error;

use crate::repository::RepositoryError;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum ShopError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("You have already reviewed this product")]
    AlreadyReviewed,

    #[error("Email is already registered")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    InsufficientStock(String),

    #[error("Invalid coupon code")]
    InvalidCode,

    #[error("Coupon has expired")]
    Expired,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    #[error("Not authorized, no token")]
    MissingToken,

    #[error("Not authorized, invalid token")]
    InvalidToken,

    #[error("Storage error: {0}")]
    Storage(#[from] RepositoryError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for ShopError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<&str> = errors.errors().keys().copied().collect();
        fields.sort_unstable();
        Self::Validation(format!("invalid fields: {}", fields.join(", ")))
    }
}

pub type Result<T> = std::result::Result<T, ShopError>;
