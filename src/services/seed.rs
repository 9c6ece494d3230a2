use std::sync::Arc;

use tracing::{info, instrument};

use crate::domain::aggregates::NewProduct;
use crate::repository::ProductRepository;
use crate::{Result, ShopError};

const SEED_PRODUCTS: &str = include_str!("../../data/products.json");

pub struct SeedService {
    products: Arc<dyn ProductRepository>,
}

impl SeedService {
    pub fn new(products: Arc<dyn ProductRepository>) -> Self {
        Self { products }
    }

    /// Replaces the whole catalog with the bundled dataset. Returns the number
    /// of products inserted.
    #[instrument(skip(self))]
    pub async fn seed_products(&self) -> Result<u64> {
        let products: Vec<NewProduct> =
            serde_json::from_str(SEED_PRODUCTS).map_err(|e| ShopError::Internal(format!("seed data: {e}")))?;

        let (removed, inserted) = self.products.replace_all(products).await?;
        info!(removed, inserted, "catalog seeded");
        Ok(inserted)
    }
}
