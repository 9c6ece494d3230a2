use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use crate::domain::aggregates::Role;
use crate::repository::{OrderRepository, ProductRepository, UserRepository};
use crate::Result;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_orders: i64,
    pub total_products: i64,
    /// Customers only; admins are not counted.
    pub total_users: i64,
    pub total_revenue: Decimal,
}

pub struct StatsService {
    orders: Arc<dyn OrderRepository>,
    products: Arc<dyn ProductRepository>,
    users: Arc<dyn UserRepository>,
}

impl StatsService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        products: Arc<dyn ProductRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self { orders, products, users }
    }

    #[instrument(skip(self))]
    pub async fn get_dashboard_stats(&self) -> Result<DashboardStats> {
        let (total_orders, total_products, total_users, total_revenue) = tokio::try_join!(
            self.orders.count(),
            self.products.count(),
            self.users.count_by_role(Role::Customer),
            self.orders.total_revenue(),
        )?;
        Ok(DashboardStats { total_orders, total_products, total_users, total_revenue })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::NewUser;
    use crate::test_utils::{memory_services, new_order, new_product};

    #[tokio::test]
    async fn test_empty_store() {
        let (services, _) = memory_services();
        let stats = services.stats.get_dashboard_stats().await.unwrap();
        assert_eq!(
            stats,
            DashboardStats { total_orders: 0, total_products: 0, total_users: 0, total_revenue: Decimal::ZERO }
        );
    }

    #[tokio::test]
    async fn test_counts_customers_and_revenue() {
        let (services, repos) = memory_services();
        repos.products.create(new_product("Sofa", 10)).await.unwrap();
        for (email, role) in [("a@example.com", Role::Customer), ("b@example.com", Role::Customer), ("c@example.com", Role::Admin)] {
            repos
                .users
                .create(NewUser { name: "x".to_string(), email: email.to_string(), password_hash: String::new(), role })
                .await
                .unwrap();
        }
        services.orders.create_order(new_order("a@example.com", &[("Sofa", 1)])).await.unwrap();
        services.orders.create_order(new_order("b@example.com", &[("Sofa", 2)])).await.unwrap();

        let stats = services.stats.get_dashboard_stats().await.unwrap();
        assert_eq!(stats.total_orders, 2);
        assert_eq!(stats.total_products, 1);
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.total_revenue, Decimal::new(149_700, 2));
    }
}
