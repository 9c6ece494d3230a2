use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::{Coupon, CouponApplication, NewCoupon};
use crate::domain::value_objects::CouponCode;
use crate::repository::{CouponRepository, RepositoryError};
use crate::{Result, ShopError};

const DUPLICATE_COUPON: &str = "Coupon already exists";

pub struct CouponService {
    coupons: Arc<dyn CouponRepository>,
}

impl CouponService {
    pub fn new(coupons: Arc<dyn CouponRepository>) -> Self {
        Self { coupons }
    }

    #[instrument(skip(self, coupon), fields(name = %coupon.name))]
    pub async fn create_coupon(&self, coupon: NewCoupon) -> Result<Coupon> {
        coupon.validate()?;
        let name = CouponCode::new(coupon.name).map_err(|e| ShopError::Validation(e.to_string()))?;

        if self.coupons.find_by_name(&name).await?.is_some() {
            return Err(ShopError::Duplicate(DUPLICATE_COUPON.to_string()));
        }

        let created = self
            .coupons
            .create(Coupon { id: Uuid::now_v7(), name, discount: coupon.discount, expiry: coupon.expiry, created_at: Utc::now() })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => ShopError::Duplicate(DUPLICATE_COUPON.to_string()),
                other => other.into(),
            })?;
        info!(coupon_id = %created.id, code = %created.name, "coupon created");
        Ok(created)
    }

    pub async fn list_coupons(&self) -> Result<Vec<Coupon>> {
        Ok(self.coupons.find_all().await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_coupon(&self, id: Uuid) -> Result<()> {
        self.coupons.delete(id).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn apply_coupon(&self, name: &str) -> Result<CouponApplication> {
        let code = CouponCode::new(name).map_err(|_| ShopError::InvalidCode)?;
        let coupon = self.coupons.find_by_name(&code).await?.ok_or(ShopError::InvalidCode)?;
        if coupon.is_expired_at(Utc::now()) {
            return Err(ShopError::Expired);
        }
        Ok(coupon.application())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::test_utils::memory_services;

    fn new_coupon(name: &str, days: i64, discount: i32) -> NewCoupon {
        NewCoupon { name: name.to_string(), expiry: Utc::now() + Duration::days(days), discount }
    }

    #[tokio::test]
    async fn test_create_normalizes_and_rejects_duplicates() {
        let (services, _) = memory_services();
        let coupon = services.coupons.create_coupon(new_coupon(" valid20 ", 7, 20)).await.unwrap();
        assert_eq!(coupon.name.as_str(), "VALID20");

        let err = services.coupons.create_coupon(new_coupon("Valid20", 7, 10)).await.unwrap_err();
        assert!(matches!(err, ShopError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_create_validates_discount() {
        let (services, _) = memory_services();
        assert!(matches!(services.coupons.create_coupon(new_coupon("ZERO", 7, 0)).await, Err(ShopError::Validation(_))));
        assert!(matches!(services.coupons.create_coupon(new_coupon("BIG", 7, 101)).await, Err(ShopError::Validation(_))));
    }

    #[tokio::test]
    async fn test_apply() {
        let (services, _) = memory_services();
        services.coupons.create_coupon(new_coupon("VALID20", 7, 20)).await.unwrap();
        services.coupons.create_coupon(new_coupon("OLD10", -1, 10)).await.unwrap();

        let applied = services.coupons.apply_coupon("valid20").await.unwrap();
        assert_eq!(applied.discount, 20);
        assert_eq!(applied.code, "VALID20");
        assert_eq!(applied.message, "Coupon VALID20 applied! You get 20% off");
        assert_eq!(services.coupons.apply_coupon("VALID20").await.unwrap(), applied);

        assert!(matches!(services.coupons.apply_coupon("OLD10").await, Err(ShopError::Expired)));
        assert!(matches!(services.coupons.apply_coupon("NOPE").await, Err(ShopError::InvalidCode)));
        assert!(matches!(services.coupons.apply_coupon("  ").await, Err(ShopError::InvalidCode)));
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let (services, _) = memory_services();
        let first = services.coupons.create_coupon(new_coupon("ONE", 7, 5)).await.unwrap();
        let second = services.coupons.create_coupon(new_coupon("TWO", 7, 5)).await.unwrap();

        let listed: Vec<Uuid> = services.coupons.list_coupons().await.unwrap().iter().map(|c| c.id).collect();
        assert_eq!(listed, vec![second.id, first.id]);

        services.coupons.delete_coupon(first.id).await.unwrap();
        services.coupons.delete_coupon(first.id).await.unwrap();
        assert_eq!(services.coupons.list_coupons().await.unwrap().len(), 1);
    }
}
