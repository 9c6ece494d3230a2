use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::conflict_on_unique;
use crate::domain::aggregates::{NewReview, Review};
use crate::domain::value_objects::Rating;
use crate::repository::{RepositoryError, Result, ReviewRepository};

const REVIEW_COLUMNS: &str = "id, user_id, product_id, rating, comment, name, created_at";

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    user_id: Uuid,
    product_id: Uuid,
    rating: i16,
    comment: String,
    name: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = RepositoryError;

    fn try_from(r: ReviewRow) -> std::result::Result<Self, Self::Error> {
        let rating = Rating::new(r.rating).map_err(|e| RepositoryError::DataCorruption(format!("review {}: {e}", r.id)))?;
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            product_id: r.product_id,
            rating,
            comment: r.comment,
            name: r.name,
            created_at: r.created_at,
        })
    }
}

pub struct PgReviewRepository {
    pool: PgPool,
}

impl PgReviewRepository {
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewRepository for PgReviewRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Review::try_from).transpose()
    }

    async fn find_by_user_and_product(&self, user_id: Uuid, product_id: Uuid) -> Result<Option<Review>> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE user_id = $1 AND product_id = $2"
        ))
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Review::try_from).transpose()
    }

    async fn find_by_product(&self, product_id: Uuid) -> Result<Vec<Review>> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE product_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Review::try_from).collect()
    }

    async fn create(&self, review: NewReview) -> Result<Review> {
        let review = review.into_review(Uuid::now_v7(), Utc::now());
        sqlx::query(
            "INSERT INTO reviews (id, user_id, product_id, rating, comment, name, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(review.id)
        .bind(review.user_id)
        .bind(review.product_id)
        .bind(review.rating.value())
        .bind(&review.comment)
        .bind(&review.name)
        .bind(review.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "review"))?;
        Ok(review)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
