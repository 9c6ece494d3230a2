use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::aggregates::{
    Fabric, Model3d, NewProduct, Product, ProductPatch, ProductQuery, RatingSummary,
};
use crate::repository::{ProductRepository, RepositoryError, Result, StockLine};

const PRODUCT_COLUMNS: &str = "id, legacy_id, title, price, description, category, image, count_in_stock, \
     rating_average, rating_count, is_best_seller, dimension_image, feature_overview, shipping_info, \
     warranty_info, fabrics, model_3d, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    legacy_id: Option<i64>,
    title: String,
    price: Decimal,
    description: String,
    category: String,
    image: String,
    count_in_stock: i32,
    rating_average: f64,
    rating_count: i32,
    is_best_seller: bool,
    dimension_image: Option<String>,
    feature_overview: String,
    shipping_info: String,
    warranty_info: String,
    fabrics: Json<Vec<Fabric>>,
    model_3d: Option<Json<Model3d>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Self {
            id: r.id,
            legacy_id: r.legacy_id,
            title: r.title,
            price: r.price,
            description: r.description,
            category: r.category,
            image: r.image,
            count_in_stock: r.count_in_stock,
            rating: RatingSummary { average: r.rating_average, count: r.rating_count },
            is_best_seller: r.is_best_seller,
            dimension_image: r.dimension_image,
            feature_overview: r.feature_overview,
            shipping_info: r.shipping_info,
            warranty_info: r.warranty_info,
            fabrics: r.fabrics.0,
            model_3d: r.model_3d.map(|m| m.0),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Escapes `LIKE` metacharacters so a keyword matches literally.
fn like_pattern(keyword: &str) -> String {
    let escaped = keyword.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}

pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert<'c, E>(executor: E, product: &Product) -> Result<Product>
    where
        E: sqlx::Executor<'c, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products ({PRODUCT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(product.id)
        .bind(product.legacy_id)
        .bind(&product.title)
        .bind(product.price)
        .bind(&product.description)
        .bind(&product.category)
        .bind(&product.image)
        .bind(product.count_in_stock)
        .bind(product.rating.average)
        .bind(product.rating.count)
        .bind(product.is_best_seller)
        .bind(&product.dimension_image)
        .bind(&product.feature_overview)
        .bind(&product.shipping_info)
        .bind(&product.warranty_info)
        .bind(Json(&product.fabrics))
        .bind(product.model_3d.as_ref().map(Json))
        .bind(product.created_at)
        .bind(product.updated_at)
        .fetch_one(executor)
        .await?;
        Ok(row.into())
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Product::from))
    }

    async fn find_by_legacy_id(&self, legacy_id: i64) -> Result<Option<Product>> {
        let row =
            sqlx::query_as::<_, ProductRow>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE legacy_id = $1"))
                .bind(legacy_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Product::from))
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE title = $1 ORDER BY created_at LIMIT 1"
        ))
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Product::from))
    }

    async fn find(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE TRUE"));
        if let Some(category) = query.category_filter() {
            qb.push(" AND category = ").push_bind(category.to_owned());
        }
        if let Some(keyword) = query.keyword_filter() {
            qb.push(" AND title ILIKE ").push_bind(like_pattern(keyword));
        }
        if let Some(min) = query.min_price {
            qb.push(" AND price >= ").push_bind(min);
        }
        if let Some(max) = query.max_price {
            qb.push(" AND price <= ").push_bind(max);
        }
        qb.push(" ORDER BY ").push(query.sort.order_by());

        let rows = qb.build_query_as::<ProductRow>().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn create(&self, product: NewProduct) -> Result<Product> {
        let product = product.into_product(Uuid::now_v7(), Utc::now());
        Self::insert(&self.pool, &product).await
    }

    async fn update(&self, id: Uuid, patch: ProductPatch) -> Result<Option<Product>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else { return Ok(None) };

        let mut product = Product::from(row);
        product.apply_patch(patch);

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products SET title = $2, price = $3, description = $4, category = $5, image = $6, \
             count_in_stock = $7, is_best_seller = $8, dimension_image = $9, feature_overview = $10, \
             shipping_info = $11, warranty_info = $12, fabrics = $13, model_3d = $14, updated_at = $15 \
             WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(&product.title)
        .bind(product.price)
        .bind(&product.description)
        .bind(&product.category)
        .bind(&product.image)
        .bind(product.count_in_stock)
        .bind(product.is_best_seller)
        .bind(&product.dimension_image)
        .bind(&product.feature_overview)
        .bind(&product.shipping_info)
        .bind(&product.warranty_info)
        .bind(Json(&product.fabrics))
        .bind(product.model_3d.as_ref().map(Json))
        .bind(product.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(row.into()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn replace_all(&self, products: Vec<NewProduct>) -> Result<(u64, u64)> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let removed = sqlx::query("DELETE FROM products").execute(&mut *tx).await?.rows_affected();
        let mut inserted = 0;
        for product in products {
            let product = product.into_product(Uuid::now_v7(), now);
            Self::insert(&mut *tx, &product).await?;
            inserted += 1;
        }
        tx.commit().await?;
        Ok((removed, inserted))
    }

    async fn count(&self) -> Result<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products").fetch_one(&self.pool).await?)
    }

    async fn reserve_stock(&self, lines: &[StockLine]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for line in lines {
            let remaining = sqlx::query_scalar::<_, i32>(
                "UPDATE products SET count_in_stock = count_in_stock - $2, updated_at = NOW() \
                 WHERE id = $1 AND count_in_stock >= $2 RETURNING count_in_stock",
            )
            .bind(line.product_id)
            .bind(line.qty)
            .fetch_optional(&mut *tx)
            .await?;

            if remaining.is_none() {
                let available = sqlx::query_scalar::<_, i32>("SELECT count_in_stock FROM products WHERE id = $1")
                    .bind(line.product_id)
                    .fetch_optional(&mut *tx)
                    .await?
                    .unwrap_or(0);
                tx.rollback().await?;
                return Err(RepositoryError::InsufficientStock { product_id: line.product_id, available });
            }
        }
        tx.commit().await?;
        Ok(())
    }

    async fn release_stock(&self, lines: &[StockLine]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for line in lines {
            sqlx::query("UPDATE products SET count_in_stock = count_in_stock + $2, updated_at = NOW() WHERE id = $1")
                .bind(line.product_id)
                .bind(line.qty)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn set_stock(&self, id: Uuid, qty: i32) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products SET count_in_stock = $2, updated_at = NOW() WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(qty)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Product::from))
    }

    async fn update_rating(&self, id: Uuid, rating: RatingSummary) -> Result<()> {
        sqlx::query("UPDATE products SET rating_average = $2, rating_count = $3, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(rating.average)
            .bind(rating.count)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
