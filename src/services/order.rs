use std::sync::Arc;

use tracing::{error, info, instrument};
use uuid::Uuid;

use super::InventoryService;
use crate::domain::aggregates::{NewOrder, Order, OrderStatus};
use crate::repository::OrderRepository;
use crate::{Result, ShopError};

const ORDER_NOT_FOUND: &str = "order not found";
const CANCEL_VIA_CANCEL: &str = "Orders are cancelled through the cancel operation";
const CANCELLED_IS_FINAL: &str = "Cancelled orders cannot change status";

pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    inventory: InventoryService,
}

impl OrderService {
    pub fn new(orders: Arc<dyn OrderRepository>, inventory: InventoryService) -> Self {
        Self { orders, inventory }
    }

    /// Reserves stock for every line, then persists the order as `Pending`.
    /// A failed insert hands the reserved stock back.
    #[instrument(skip(self, order), fields(customer = %order.customer.email))]
    pub async fn create_order(&self, order: NewOrder) -> Result<Order> {
        order.check()?;

        let items = self.inventory.reserve_stock(&order.items).await?;
        let order = NewOrder { items: items.clone(), ..order };

        match self.orders.create(order).await {
            Ok(created) => {
                info!(order_id = %created.id, total = %created.total_amount, "order created");
                Ok(created)
            }
            Err(e) => {
                if let Err(release_err) = self.inventory.release_stock(&items).await {
                    error!(error = %release_err, "failed to release stock after order insert failed");
                }
                Err(e.into())
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn get_orders_by_user_email(&self, email: &str) -> Result<Vec<Order>> {
        Ok(self.orders.find_by_customer_email(email).await?)
    }

    #[instrument(skip(self))]
    pub async fn get_all_orders(&self) -> Result<Vec<Order>> {
        Ok(self.orders.find_all().await?)
    }

    #[instrument(skip(self))]
    pub async fn get_order_by_id(&self, id: Uuid) -> Result<Order> {
        self.orders.find_by_id(id).await?.ok_or_else(|| ShopError::NotFound(ORDER_NOT_FOUND.to_string()))
    }

    /// Overwrites the status. Any known status may follow any other, except
    /// that orders are only cancelled through [`Self::cancel_order`] and a
    /// cancelled order keeps its status.
    #[instrument(skip(self))]
    pub async fn update_status(&self, id: Uuid, status: &str) -> Result<Order> {
        let status = OrderStatus::parse(status)
            .ok_or_else(|| ShopError::Validation(format!("unknown order status: {status}")))?;
        if status == OrderStatus::Cancelled {
            return Err(ShopError::Validation(CANCEL_VIA_CANCEL.to_string()));
        }
        match self.orders.update_status(id, status).await? {
            Some(order) => {
                info!(order_id = %order.id, status = %order.status, "order status updated");
                Ok(order)
            }
            None => {
                self.get_order_by_id(id).await?;
                Err(ShopError::Validation(CANCELLED_IS_FINAL.to_string()))
            }
        }
    }

    /// Marks the order cancelled and returns its stock. Repeat calls leave
    /// stock alone. If the stock cannot be returned the previous status is
    /// restored so the cancel can be retried.
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, id: Uuid) -> Result<Order> {
        loop {
            let current = self.get_order_by_id(id).await?;
            if current.status == OrderStatus::Cancelled {
                return Ok(current);
            }
            let Some(cancelled) =
                self.orders.compare_and_set_status(id, current.status, OrderStatus::Cancelled).await?
            else {
                continue;
            };

            if let Err(e) = self.inventory.release_stock(&cancelled.items).await {
                if let Err(revert_err) =
                    self.orders.compare_and_set_status(id, OrderStatus::Cancelled, current.status).await
                {
                    error!(order_id = %id, error = %revert_err, "failed to restore status after stock release failed");
                }
                return Err(e);
            }
            info!(order_id = %cancelled.id, "order cancelled, stock released");
            return Ok(cancelled);
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use super::*;
    use crate::domain::aggregates::{NewProduct, Product, ProductPatch, ProductQuery, RatingSummary};
    use crate::repository::{self, ProductRepository, RepositoryError, StockLine};
    use crate::test_utils::{memory_services, new_order, new_product};

    /// Delegates to a real repository but refuses to hand stock back.
    struct ReleaseFails(Arc<dyn ProductRepository>);

    #[async_trait]
    impl ProductRepository for ReleaseFails {
        async fn find_by_id(&self, id: Uuid) -> repository::Result<Option<Product>> { self.0.find_by_id(id).await }
        async fn find_by_legacy_id(&self, legacy_id: i64) -> repository::Result<Option<Product>> {
            self.0.find_by_legacy_id(legacy_id).await
        }
        async fn find_by_title(&self, title: &str) -> repository::Result<Option<Product>> {
            self.0.find_by_title(title).await
        }
        async fn find(&self, query: &ProductQuery) -> repository::Result<Vec<Product>> { self.0.find(query).await }
        async fn create(&self, product: NewProduct) -> repository::Result<Product> { self.0.create(product).await }
        async fn update(&self, id: Uuid, patch: ProductPatch) -> repository::Result<Option<Product>> {
            self.0.update(id, patch).await
        }
        async fn delete(&self, id: Uuid) -> repository::Result<bool> { self.0.delete(id).await }
        async fn replace_all(&self, products: Vec<NewProduct>) -> repository::Result<(u64, u64)> {
            self.0.replace_all(products).await
        }
        async fn count(&self) -> repository::Result<i64> { self.0.count().await }
        async fn reserve_stock(&self, lines: &[StockLine]) -> repository::Result<()> { self.0.reserve_stock(lines).await }
        async fn release_stock(&self, _lines: &[StockLine]) -> repository::Result<()> {
            Err(RepositoryError::DataCorruption("stock release refused".to_string()))
        }
        async fn set_stock(&self, id: Uuid, qty: i32) -> repository::Result<Option<Product>> {
            self.0.set_stock(id, qty).await
        }
        async fn update_rating(&self, id: Uuid, rating: RatingSummary) -> repository::Result<()> {
            self.0.update_rating(id, rating).await
        }
    }

    async fn stock_of(repos: &crate::repository::Repositories, id: Uuid) -> i32 {
        repos.products.find_by_id(id).await.unwrap().unwrap().count_in_stock
    }

    #[tokio::test]
    async fn test_create_order_reserves_stock() {
        let (services, repos) = memory_services();
        let sofa = repos.products.create(new_product("Sofa", 5)).await.unwrap();

        let order = services.orders.create_order(new_order("jane@example.com", &[("Sofa", 2)])).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items[0].product_id, Some(sofa.id));
        assert_eq!(repos.products.find_by_id(sofa.id).await.unwrap().unwrap().count_in_stock, 3);
    }

    #[tokio::test]
    async fn test_failed_reservation_creates_nothing() {
        let (services, repos) = memory_services();
        let sofa = repos.products.create(new_product("Sofa", 5)).await.unwrap();
        let lamp = repos.products.create(new_product("Lamp", 1)).await.unwrap();

        let err = services
            .orders
            .create_order(new_order("jane@example.com", &[("Sofa", 2), ("Lamp", 3)]))
            .await
            .unwrap_err();

        assert!(matches!(err, ShopError::InsufficientStock(_)));
        assert_eq!(repos.orders.count().await.unwrap(), 0);
        assert_eq!(repos.products.find_by_id(sofa.id).await.unwrap().unwrap().count_in_stock, 5);
        assert_eq!(repos.products.find_by_id(lamp.id).await.unwrap().unwrap().count_in_stock, 1);
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let (services, _) = memory_services();
        let err = services.orders.create_order(new_order("jane@example.com", &[("Ghost", 1)])).await.unwrap_err();
        assert!(matches!(err, ShopError::NotFound(ref m) if m == "Product \"Ghost\" not found"));
    }

    #[tokio::test]
    async fn test_validation_runs_before_reservation() {
        let (services, repos) = memory_services();
        let sofa = repos.products.create(new_product("Sofa", 5)).await.unwrap();

        let mut empty = new_order("jane@example.com", &[]);
        empty.total_amount = Decimal::ZERO;
        assert!(matches!(services.orders.create_order(empty).await, Err(ShopError::Validation(_))));

        let zero_qty = new_order("jane@example.com", &[("Sofa", 0)]);
        assert!(matches!(services.orders.create_order(zero_qty).await, Err(ShopError::Validation(_))));

        let bad_email = new_order("not-an-email", &[("Sofa", 1)]);
        assert!(matches!(services.orders.create_order(bad_email).await, Err(ShopError::Validation(_))));

        assert_eq!(repos.products.find_by_id(sofa.id).await.unwrap().unwrap().count_in_stock, 5);
    }

    #[tokio::test]
    async fn test_orders_by_email_newest_first() {
        let (services, repos) = memory_services();
        repos.products.create(new_product("Sofa", 10)).await.unwrap();

        let first = services.orders.create_order(new_order("jane@example.com", &[("Sofa", 1)])).await.unwrap();
        let second = services.orders.create_order(new_order("jane@example.com", &[("Sofa", 1)])).await.unwrap();
        services.orders.create_order(new_order("other@example.com", &[("Sofa", 1)])).await.unwrap();

        let mine = services.orders.get_orders_by_user_email("jane@example.com").await.unwrap();
        assert_eq!(mine.iter().map(|o| o.id).collect::<Vec<_>>(), vec![second.id, first.id]);
        assert_eq!(services.orders.get_all_orders().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_update_status() {
        let (services, repos) = memory_services();
        repos.products.create(new_product("Sofa", 10)).await.unwrap();
        let order = services.orders.create_order(new_order("jane@example.com", &[("Sofa", 1)])).await.unwrap();

        let shipped = services.orders.update_status(order.id, "shipping").await.unwrap();
        assert_eq!(shipped.status, OrderStatus::Shipping);
        // No transition rules: delivered orders may go back to pending.
        services.orders.update_status(order.id, "delivered").await.unwrap();
        let back = services.orders.update_status(order.id, "Pending").await.unwrap();
        assert_eq!(back.status, OrderStatus::Pending);

        assert!(matches!(services.orders.update_status(order.id, "lost").await, Err(ShopError::Validation(_))));
        assert!(matches!(
            services.orders.update_status(Uuid::now_v7(), "shipping").await,
            Err(ShopError::NotFound(ref m)) if m == "order not found"
        ));
    }

    #[tokio::test]
    async fn test_cancel_releases_stock_once() {
        let (services, repos) = memory_services();
        let sofa = repos.products.create(new_product("Sofa", 5)).await.unwrap();
        let order = services.orders.create_order(new_order("jane@example.com", &[("Sofa", 2)])).await.unwrap();

        let cancelled = services.orders.cancel_order(order.id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(repos.products.find_by_id(sofa.id).await.unwrap().unwrap().count_in_stock, 5);

        services.orders.cancel_order(order.id).await.unwrap();
        assert_eq!(repos.products.find_by_id(sofa.id).await.unwrap().unwrap().count_in_stock, 5);

        assert!(matches!(services.orders.cancel_order(Uuid::now_v7()).await, Err(ShopError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_cancelled_order_cannot_be_reopened() {
        let (services, repos) = memory_services();
        let sofa = repos.products.create(new_product("Sofa", 5)).await.unwrap();
        let order = services.orders.create_order(new_order("jane@example.com", &[("Sofa", 2)])).await.unwrap();

        services.orders.cancel_order(order.id).await.unwrap();
        assert!(matches!(
            services.orders.update_status(order.id, "Pending").await,
            Err(ShopError::Validation(ref m)) if m == "Cancelled orders cannot change status"
        ));
        services.orders.cancel_order(order.id).await.unwrap();

        assert_eq!(services.orders.get_order_by_id(order.id).await.unwrap().status, OrderStatus::Cancelled);
        assert_eq!(stock_of(&repos, sofa.id).await, 5);
    }

    #[tokio::test]
    async fn test_status_update_cannot_cancel() {
        let (services, repos) = memory_services();
        let sofa = repos.products.create(new_product("Sofa", 5)).await.unwrap();
        let order = services.orders.create_order(new_order("jane@example.com", &[("Sofa", 2)])).await.unwrap();

        assert!(matches!(services.orders.update_status(order.id, "cancelled").await, Err(ShopError::Validation(_))));
        assert_eq!(services.orders.get_order_by_id(order.id).await.unwrap().status, OrderStatus::Pending);
        assert_eq!(stock_of(&repos, sofa.id).await, 3);

        services.orders.cancel_order(order.id).await.unwrap();
        assert_eq!(stock_of(&repos, sofa.id).await, 5);
    }

    #[tokio::test]
    async fn test_failed_release_restores_status() {
        let (services, repos) = memory_services();
        let sofa = repos.products.create(new_product("Sofa", 5)).await.unwrap();
        let order = services.orders.create_order(new_order("jane@example.com", &[("Sofa", 2)])).await.unwrap();
        services.orders.update_status(order.id, "shipping").await.unwrap();

        let failing = OrderService::new(
            repos.orders.clone(),
            InventoryService::new(Arc::new(ReleaseFails(repos.products.clone()))),
        );
        assert!(matches!(failing.cancel_order(order.id).await, Err(ShopError::Storage(_))));
        assert_eq!(services.orders.get_order_by_id(order.id).await.unwrap().status, OrderStatus::Shipping);
        assert_eq!(stock_of(&repos, sofa.id).await, 3);

        let retried = services.orders.cancel_order(order.id).await.unwrap();
        assert_eq!(retried.status, OrderStatus::Cancelled);
        assert_eq!(stock_of(&repos, sofa.id).await, 5);
    }
}
