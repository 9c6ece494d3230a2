//! Coupon Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::value_objects::CouponCode;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: Uuid,
    pub name: CouponCode,
    /// Percentage off the order total.
    pub discount: i32,
    pub expiry: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool { now > self.expiry }

    pub fn application(&self) -> CouponApplication {
        CouponApplication {
            discount: self.discount,
            code: self.name.to_string(),
            message: format!("Coupon {} applied! You get {}% off", self.name, self.discount),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct NewCoupon {
    #[validate(length(min = 1, max = 32))]
    pub name: String,
    pub expiry: DateTime<Utc>,
    #[validate(range(min = 1, max = 100))]
    pub discount: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponApplication {
    pub discount: i32,
    pub code: String,
    pub message: String,
}
