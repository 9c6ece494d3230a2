//! Review Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::Rating;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    #[serde(rename = "product")]
    pub product_id: Uuid,
    pub rating: Rating,
    pub comment: String,
    /// Reviewer display name at the time of writing.
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn is_authored_by(&self, user_id: Uuid) -> bool { self.user_id == user_id }
}

#[derive(Clone, Debug)]
pub struct NewReview {
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub rating: Rating,
    pub comment: String,
    pub name: String,
}

impl NewReview {
    pub fn into_review(self, id: Uuid, now: DateTime<Utc>) -> Review {
        Review {
            id,
            user_id: self.user_id,
            product_id: self.product_id,
            rating: self.rating,
            comment: self.comment,
            name: self.name,
            created_at: now,
        }
    }
}
