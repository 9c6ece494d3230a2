//! Stock checks and adjustments for order lines.
//!
//! A line resolves to a product by its `productId` when present and by exact
//! title otherwise.

use std::sync::Arc;

use serde::Serialize;
use tracing::{instrument, warn};
use uuid::Uuid;

use super::{lookup_product, PRODUCT_NOT_FOUND};
use crate::domain::aggregates::{LineItem, Product};
use crate::domain::value_objects::ProductRef;
use crate::repository::{ProductRepository, RepositoryError, StockLine};
use crate::{Result, ShopError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub available: bool,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    pub product_id: Uuid,
    pub title: String,
    pub count_in_stock: i32,
}

impl From<&Product> for StockLevel {
    fn from(p: &Product) -> Self {
        Self { product_id: p.id, title: p.title.clone(), count_in_stock: p.count_in_stock }
    }
}

fn not_found_message(title: &str) -> String {
    format!("Product \"{title}\" not found")
}

fn shortage_message(title: &str, available: i32) -> String {
    format!("Product \"{title}\" insufficient stock (Available: {available})")
}

#[derive(Clone)]
pub struct InventoryService {
    products: Arc<dyn ProductRepository>,
}

impl InventoryService {
    pub fn new(products: Arc<dyn ProductRepository>) -> Self {
        Self { products }
    }

    async fn resolve(&self, item: &LineItem) -> Result<Option<Product>> {
        if let Some(id) = item.product_id {
            if let Some(product) = self.products.find_by_id(id).await? {
                return Ok(Some(product));
            }
        }
        Ok(self.products.find_by_title(&item.title).await?)
    }

    /// Resolves every line and checks it against current stock. Lines come
    /// back with their product id filled in.
    async fn resolve_all(&self, items: &[LineItem]) -> Result<Vec<LineItem>> {
        let mut resolved = Vec::with_capacity(items.len());
        for item in items {
            let product = self
                .resolve(item)
                .await?
                .ok_or_else(|| ShopError::NotFound(not_found_message(&item.title)))?;
            if product.count_in_stock < item.qty {
                return Err(ShopError::InsufficientStock(shortage_message(&item.title, product.count_in_stock)));
            }
            resolved.push(LineItem { product_id: Some(product.id), ..item.clone() });
        }
        Ok(resolved)
    }

    #[instrument(skip(self, items), fields(lines = items.len()))]
    pub async fn check_availability(&self, items: &[LineItem]) -> Result<Availability> {
        match self.resolve_all(items).await {
            Ok(_) => Ok(Availability { available: true, message: "All products available".to_string() }),
            Err(ShopError::NotFound(message) | ShopError::InsufficientStock(message)) => {
                Ok(Availability { available: false, message })
            }
            Err(e) => Err(e),
        }
    }

    /// Decrements stock for every line or for none of them.
    #[instrument(skip(self, items), fields(lines = items.len()))]
    pub async fn reserve_stock(&self, items: &[LineItem]) -> Result<Vec<LineItem>> {
        let resolved = self.resolve_all(items).await?;
        let lines: Vec<StockLine> = resolved
            .iter()
            .filter_map(|item| item.product_id.map(|product_id| StockLine { product_id, qty: item.qty }))
            .collect();

        match self.products.reserve_stock(&lines).await {
            Ok(()) => Ok(resolved),
            Err(RepositoryError::InsufficientStock { product_id, available }) => {
                let title = resolved
                    .iter()
                    .find(|item| item.product_id == Some(product_id))
                    .map_or("unknown", |item| item.title.as_str());
                warn!(%product_id, available, "stock changed during reservation");
                Err(ShopError::InsufficientStock(shortage_message(title, available)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Returns stock for each line. Lines whose product is gone are skipped.
    #[instrument(skip(self, items), fields(lines = items.len()))]
    pub async fn release_stock(&self, items: &[LineItem]) -> Result<()> {
        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            match self.resolve(item).await? {
                Some(product) => lines.push(StockLine { product_id: product.id, qty: item.qty }),
                None => warn!(title = %item.title, "skipping release for missing product"),
            }
        }
        self.products.release_stock(&lines).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn update_stock(&self, product: ProductRef, quantity: i32) -> Result<StockLevel> {
        if quantity < 0 {
            return Err(ShopError::Validation("stock quantity must not be negative".to_string()));
        }
        let found = lookup_product(self.products.as_ref(), product)
            .await?
            .ok_or_else(|| ShopError::NotFound(PRODUCT_NOT_FOUND.to_string()))?;
        let updated = self
            .products
            .set_stock(found.id, quantity)
            .await?
            .ok_or_else(|| ShopError::NotFound(PRODUCT_NOT_FOUND.to_string()))?;
        Ok(StockLevel::from(&updated))
    }

    #[instrument(skip(self))]
    pub async fn get_stock_level(&self, product: ProductRef) -> Result<StockLevel> {
        let found = lookup_product(self.products.as_ref(), product)
            .await?
            .ok_or_else(|| ShopError::NotFound(PRODUCT_NOT_FOUND.to_string()))?;
        Ok(StockLevel::from(&found))
    }
}
