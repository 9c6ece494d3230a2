//! `PostgreSQL` repositories.
//!
//! # Tables
//!
//! - `products` - catalog; fabrics and 3D assets as JSONB
//! - `orders` - customer snapshot and line items as JSONB
//! - `reviews` - unique on `(user_id, product_id)`
//! - `coupons` - unique on `name`
//! - `users` - unique on `email`; addresses as JSONB
//!
//! # Migrations
//!
//! Stored in `migrations/` and embedded in the binary; [`run_migrations`]
//! applies them at startup.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::RepositoryError;

mod coupons;
mod orders;
mod products;
mod reviews;
mod users;

pub use coupons::PgCouponRepository;
pub use orders::PgOrderRepository;
pub use products::PgProductRepository;
pub use reviews::PgReviewRepository;
pub use users::PgUserRepository;

/// Create a `PostgreSQL` connection pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Apply embedded migrations.
///
/// # Errors
///
/// Returns the migrator error if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Maps a unique violation to [`RepositoryError::Conflict`].
fn conflict_on_unique(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(format!("{what} already exists"));
        }
    }
    RepositoryError::Database(err)
}
