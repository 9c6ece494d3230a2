use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{lookup_product, PRODUCT_NOT_FOUND};
use crate::domain::aggregates::{NewReview, RatingSummary, Review, User};
use crate::domain::value_objects::{ProductRef, Rating};
use crate::repository::{ProductRepository, RepositoryError, ReviewRepository};
use crate::{Result, ShopError};

#[derive(Clone, Debug, Deserialize)]
pub struct ReviewRequest {
    pub rating: i16,
    #[serde(default)]
    pub comment: String,
}

pub struct ReviewService {
    reviews: Arc<dyn ReviewRepository>,
    products: Arc<dyn ProductRepository>,
}

impl ReviewService {
    pub fn new(reviews: Arc<dyn ReviewRepository>, products: Arc<dyn ProductRepository>) -> Self {
        Self { reviews, products }
    }

    /// Writes the average over every current review back onto the product.
    async fn recompute_rating(&self, product_id: Uuid) -> Result<RatingSummary> {
        let reviews = self.reviews.find_by_product(product_id).await?;
        let summary = RatingSummary::from_ratings(reviews.iter().map(|r| r.rating));
        self.products.update_rating(product_id, summary).await?;
        Ok(summary)
    }

    #[instrument(skip(self, author, request), fields(user_id = %author.id))]
    pub async fn add_review(&self, author: &User, product: ProductRef, request: ReviewRequest) -> Result<Review> {
        let rating = Rating::new(request.rating).map_err(|e| ShopError::Validation(e.to_string()))?;

        let product = lookup_product(self.products.as_ref(), product)
            .await?
            .ok_or_else(|| ShopError::NotFound(PRODUCT_NOT_FOUND.to_string()))?;

        if self.reviews.find_by_user_and_product(author.id, product.id).await?.is_some() {
            return Err(ShopError::AlreadyReviewed);
        }

        let review = self
            .reviews
            .create(NewReview {
                user_id: author.id,
                product_id: product.id,
                rating,
                comment: request.comment,
                name: author.name.clone(),
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => ShopError::AlreadyReviewed,
                other => other.into(),
            })?;

        let summary = self.recompute_rating(product.id).await?;
        info!(product_id = %product.id, average = summary.average, count = summary.count, "review added");
        Ok(review)
    }

    #[instrument(skip(self))]
    pub async fn get_reviews(&self, product: ProductRef) -> Result<Vec<Review>> {
        let product = lookup_product(self.products.as_ref(), product)
            .await?
            .ok_or_else(|| ShopError::NotFound(PRODUCT_NOT_FOUND.to_string()))?;
        Ok(self.reviews.find_by_product(product.id).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_review(&self, review_id: Uuid, user_id: Uuid) -> Result<()> {
        let review = self
            .reviews
            .find_by_id(review_id)
            .await?
            .ok_or_else(|| ShopError::NotFound("Review not found".to_string()))?;
        if !review.is_authored_by(user_id) {
            return Err(ShopError::Forbidden("You can only delete your own reviews".to_string()));
        }

        self.reviews.delete(review_id).await?;
        self.recompute_rating(review.product_id).await?;
        info!(%review_id, product_id = %review.product_id, "review deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{hash_password, NewUser, Role};
    use crate::repository::Repositories;
    use crate::test_utils::{memory_services, new_product};

    async fn user(repos: &Repositories, name: &str) -> User {
        repos
            .users
            .create(NewUser {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                password_hash: hash_password("secret1").unwrap(),
                role: Role::Customer,
            })
            .await
            .unwrap()
    }

    fn request(rating: i16) -> ReviewRequest {
        ReviewRequest { rating, comment: "Comfortable".to_string() }
    }

    #[tokio::test]
    async fn test_average_rating() {
        let (services, repos) = memory_services();
        let sofa = repos.products.create(new_product("Sofa", 1)).await.unwrap();
        let ann = user(&repos, "Ann").await;
        let bob = user(&repos, "Bob").await;

        services.reviews.add_review(&ann, sofa.id.into(), request(4)).await.unwrap();
        services.reviews.add_review(&bob, sofa.id.into(), request(5)).await.unwrap();

        let rating = repos.products.find_by_id(sofa.id).await.unwrap().unwrap().rating;
        assert_eq!(rating, RatingSummary { average: 4.5, count: 2 });
        assert_eq!(services.reviews.get_reviews(sofa.id.into()).await.unwrap()[0].name, "Bob");
    }

    #[tokio::test]
    async fn test_one_review_per_user() {
        let (services, repos) = memory_services();
        let sofa = repos.products.create(new_product("Sofa", 1)).await.unwrap();
        let ann = user(&repos, "Ann").await;

        services.reviews.add_review(&ann, sofa.id.into(), request(4)).await.unwrap();
        let err = services.reviews.add_review(&ann, sofa.id.into(), request(2)).await.unwrap_err();
        assert!(matches!(err, ShopError::AlreadyReviewed));
    }

    #[tokio::test]
    async fn test_rejects_bad_rating_and_missing_product() {
        let (services, repos) = memory_services();
        let sofa = repos.products.create(new_product("Sofa", 1)).await.unwrap();
        let ann = user(&repos, "Ann").await;

        assert!(matches!(services.reviews.add_review(&ann, sofa.id.into(), request(6)).await, Err(ShopError::Validation(_))));
        assert!(matches!(
            services.reviews.add_review(&ann, Uuid::now_v7().into(), request(3)).await,
            Err(ShopError::NotFound(_))
        ));
        assert!(matches!(services.reviews.get_reviews(Uuid::now_v7().into()).await, Err(ShopError::NotFound(_))));
        assert!(services.reviews.get_reviews(sofa.id.into()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_resets_rating_when_last_review_goes() {
        let (services, repos) = memory_services();
        let sofa = repos.products.create(new_product("Sofa", 1)).await.unwrap();
        let ann = user(&repos, "Ann").await;
        let bob = user(&repos, "Bob").await;

        let review = services.reviews.add_review(&ann, sofa.id.into(), request(2)).await.unwrap();

        let err = services.reviews.delete_review(review.id, bob.id).await.unwrap_err();
        assert!(matches!(err, ShopError::Forbidden(_)));

        services.reviews.delete_review(review.id, ann.id).await.unwrap();
        let rating = repos.products.find_by_id(sofa.id).await.unwrap().unwrap().rating;
        assert_eq!(rating, RatingSummary::default());

        assert!(matches!(services.reviews.delete_review(review.id, ann.id).await, Err(ShopError::NotFound(_))));
    }
}
