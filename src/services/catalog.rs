use std::sync::Arc;

use tracing::{info, instrument};
use validator::Validate;

use super::{lookup_product, PRODUCT_NOT_FOUND};
use crate::domain::aggregates::{NewProduct, Product, ProductPatch, ProductQuery};
use crate::domain::value_objects::ProductRef;
use crate::repository::ProductRepository;
use crate::{Result, ShopError};

pub struct CatalogService {
    products: Arc<dyn ProductRepository>,
}

impl CatalogService {
    pub fn new(products: Arc<dyn ProductRepository>) -> Self {
        Self { products }
    }

    async fn find(&self, product: ProductRef) -> Result<Product> {
        lookup_product(self.products.as_ref(), product)
            .await?
            .ok_or_else(|| ShopError::NotFound(PRODUCT_NOT_FOUND.to_string()))
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        Ok(self.products.find(query).await?)
    }

    pub async fn get_product(&self, product: ProductRef) -> Result<Product> {
        self.find(product).await
    }

    #[instrument(skip(self, product), fields(title = %product.title))]
    pub async fn create_product(&self, product: NewProduct) -> Result<Product> {
        product.validate()?;
        let created = self.products.create(product).await?;
        info!(product_id = %created.id, "product created");
        Ok(created)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_product(&self, product: ProductRef, patch: ProductPatch) -> Result<Product> {
        patch.validate()?;
        let existing = self.find(product).await?;
        self.products
            .update(existing.id, patch)
            .await?
            .ok_or_else(|| ShopError::NotFound(PRODUCT_NOT_FOUND.to_string()))
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, product: ProductRef) -> Result<()> {
        let existing = self.find(product).await?;
        if !self.products.delete(existing.id).await? {
            return Err(ShopError::NotFound(PRODUCT_NOT_FOUND.to_string()));
        }
        info!(product_id = %existing.id, "product deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::*;
    use crate::domain::aggregates::SortStrategy;
    use crate::test_utils::{memory_services, new_product};

    fn priced(title: &str, cents: i64, category: &str) -> NewProduct {
        NewProduct { price: Decimal::new(cents, 2), category: category.to_string(), ..new_product(title, 1) }
    }

    #[tokio::test]
    async fn test_filters_and_sorts() {
        let (services, _) = memory_services();
        services.catalog.create_product(priced("Cloud Sofa", 150_000, "Sofas")).await.unwrap();
        services.catalog.create_product(priced("Oak Table", 90_000, "Tables")).await.unwrap();
        services.catalog.create_product(priced("Mini Sofa", 60_000, "Sofas")).await.unwrap();

        let sofas = services
            .catalog
            .list_products(&ProductQuery { category: Some("Sofas".to_string()), sort: SortStrategy::PriceAsc, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(sofas.iter().map(|p| p.title.as_str()).collect::<Vec<_>>(), vec!["Mini Sofa", "Cloud Sofa"]);

        let all = services
            .catalog
            .list_products(&ProductQuery { category: Some("all".to_string()), keyword: Some("sofa".to_string()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let bounded = services
            .catalog
            .list_products(&ProductQuery {
                min_price: Some(Decimal::new(70_000, 2)),
                max_price: Some(Decimal::new(100_000, 2)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(bounded.len(), 1);
        assert_eq!(bounded[0].title, "Oak Table");
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (services, _) = memory_services();
        let sofa = services.catalog.create_product(new_product("Sofa", 2)).await.unwrap();

        let patch = ProductPatch { price: Some(Decimal::new(100, 0)), is_best_seller: Some(true), ..Default::default() };
        let updated = services.catalog.update_product(sofa.id.into(), patch).await.unwrap();
        assert_eq!(updated.price, Decimal::new(100, 0));
        assert!(updated.is_best_seller);
        assert_eq!(updated.title, "Sofa");

        services.catalog.delete_product(sofa.id.into()).await.unwrap();
        assert!(matches!(services.catalog.get_product(sofa.id.into()).await, Err(ShopError::NotFound(_))));
        assert!(matches!(services.catalog.delete_product(sofa.id.into()).await, Err(ShopError::NotFound(_))));
        assert!(matches!(
            services.catalog.update_product(Uuid::now_v7().into(), ProductPatch::default()).await,
            Err(ShopError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get_by_legacy_id() {
        let (services, _) = memory_services();
        let sofa = services.catalog.create_product(NewProduct { legacy_id: Some(7), ..new_product("Sofa", 2) }).await.unwrap();
        let found = services.catalog.get_product("7".parse().unwrap()).await.unwrap();
        assert_eq!(found.id, sofa.id);
    }

    #[tokio::test]
    async fn test_create_rejects_negative_price() {
        let (services, _) = memory_services();
        let product = NewProduct { price: Decimal::new(-1, 0), ..new_product("Sofa", 2) };
        assert!(matches!(services.catalog.create_product(product).await, Err(ShopError::Validation(_))));
    }
}
