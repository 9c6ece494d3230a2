use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::conflict_on_unique;
use crate::domain::aggregates::Coupon;
use crate::domain::value_objects::CouponCode;
use crate::repository::{CouponRepository, RepositoryError, Result};

#[derive(sqlx::FromRow)]
struct CouponRow {
    id: Uuid,
    name: String,
    discount: i32,
    expiry: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = RepositoryError;

    fn try_from(r: CouponRow) -> std::result::Result<Self, Self::Error> {
        let name = CouponCode::new(r.name).map_err(|e| RepositoryError::DataCorruption(format!("coupon {}: {e}", r.id)))?;
        Ok(Self { id: r.id, name, discount: r.discount, expiry: r.expiry, created_at: r.created_at })
    }
}

pub struct PgCouponRepository {
    pool: PgPool,
}

impl PgCouponRepository {
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CouponRepository for PgCouponRepository {
    async fn find_by_name(&self, name: &CouponCode) -> Result<Option<Coupon>> {
        let row = sqlx::query_as::<_, CouponRow>(
            "SELECT id, name, discount, expiry, created_at FROM coupons WHERE name = $1",
        )
        .bind(name.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Coupon::try_from).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Coupon>> {
        let rows = sqlx::query_as::<_, CouponRow>(
            "SELECT id, name, discount, expiry, created_at FROM coupons ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Coupon::try_from).collect()
    }

    async fn create(&self, coupon: Coupon) -> Result<Coupon> {
        sqlx::query("INSERT INTO coupons (id, name, discount, expiry, created_at) VALUES ($1, $2, $3, $4, $5)")
            .bind(coupon.id)
            .bind(coupon.name.as_str())
            .bind(coupon.discount)
            .bind(coupon.expiry)
            .bind(coupon.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "coupon"))?;
        Ok(coupon)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM coupons WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
