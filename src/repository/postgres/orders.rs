use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::aggregates::{CustomerSnapshot, LineItem, NewOrder, Order, OrderStatus};
use crate::repository::{OrderRepository, RepositoryError, Result};

const ORDER_COLUMNS: &str = "id, customer, items, total_amount, payment_method, status, created_at";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    customer: Json<CustomerSnapshot>,
    items: Json<Vec<LineItem>>,
    total_amount: Decimal,
    payment_method: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(r: OrderRow) -> std::result::Result<Self, Self::Error> {
        let status = OrderStatus::parse(&r.status)
            .ok_or_else(|| RepositoryError::DataCorruption(format!("order {} has unknown status {:?}", r.id, r.status)))?;
        Ok(Self {
            id: r.id,
            customer: r.customer.0,
            items: r.items.0,
            total_amount: r.total_amount,
            payment_method: r.payment_method,
            status,
            created_at: r.created_at,
        })
    }
}

fn into_orders(rows: Vec<OrderRow>) -> Result<Vec<Order>> {
    rows.into_iter().map(Order::try_from).collect()
}

pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Order::try_from).transpose()
    }

    async fn find_by_customer_email(&self, email: &str) -> Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_email = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await?;
        into_orders(rows)
    }

    async fn find_all(&self) -> Result<Vec<Order>> {
        let rows =
            sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC"))
                .fetch_all(&self.pool)
                .await?;
        into_orders(rows)
    }

    async fn create(&self, order: NewOrder) -> Result<Order> {
        let order = order.into_order(Uuid::now_v7(), Utc::now());
        sqlx::query(
            "INSERT INTO orders (id, customer, customer_email, items, total_amount, payment_method, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(order.id)
        .bind(Json(&order.customer))
        .bind(&order.customer.email)
        .bind(Json(&order.items))
        .bind(order.total_amount)
        .bind(&order.payment_method)
        .bind(order.status.as_str())
        .bind(order.created_at)
        .execute(&self.pool)
        .await?;
        Ok(order)
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders SET status = $2 WHERE id = $1 AND status <> $3 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(OrderStatus::Cancelled.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Order::try_from).transpose()
    }

    async fn compare_and_set_status(&self, id: Uuid, from: OrderStatus, to: OrderStatus) -> Result<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders SET status = $3 WHERE id = $1 AND status = $2 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Order::try_from).transpose()
    }

    async fn count(&self) -> Result<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders").fetch_one(&self.pool).await?)
    }

    async fn total_revenue(&self) -> Result<Decimal> {
        Ok(sqlx::query_scalar::<_, Decimal>("SELECT COALESCE(SUM(total_amount), 0) FROM orders")
            .fetch_one(&self.pool)
            .await?)
    }
}
