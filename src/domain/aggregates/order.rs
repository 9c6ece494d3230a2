//! Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::product::non_negative_price;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub customer: CustomerSnapshot,
    pub items: Vec<LineItem>,
    pub total_amount: Decimal,
    pub payment_method: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Customer details copied onto the order at checkout.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct CustomerSnapshot {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Resolved at reservation time; absent on orders from clients that only
    /// send titles and whose product has since disappeared.
    #[serde(default)]
    pub product_id: Option<Uuid>,
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(range(min = 1))]
    pub qty: i32,
    #[serde(default)]
    #[validate(custom = "non_negative_price")]
    pub price: Decimal,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    Pending,
    #[serde(rename = "shipping")]
    Shipping,
    #[serde(rename = "delivered")]
    Delivered,
    #[serde(rename = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Shipping => "shipping",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Pending" => Some(Self::Pending),
            "shipping" => Some(Self::Shipping),
            "delivered" => Some(Self::Delivered),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

/// Checkout request as submitted by the storefront.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub customer: CustomerSnapshot,
    #[validate(length(min = 1))]
    pub items: Vec<LineItem>,
    #[validate(custom = "non_negative_price")]
    pub total_amount: Decimal,
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
}

fn default_payment_method() -> String { "COD".to_string() }

impl NewOrder {
    /// Validates the request along with its customer snapshot and every line.
    pub fn check(&self) -> Result<(), validator::ValidationErrors> {
        self.validate()?;
        self.customer.validate()?;
        self.items.iter().try_for_each(Validate::validate)
    }

    pub fn into_order(self, id: Uuid, now: DateTime<Utc>) -> Order {
        Order {
            id,
            customer: self.customer,
            items: self.items,
            total_amount: self.total_amount,
            payment_method: self.payment_method,
            status: OrderStatus::Pending,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkout(items: Vec<LineItem>) -> NewOrder {
        NewOrder {
            customer: CustomerSnapshot { name: "John Doe".into(), email: "john@example.com".into(), ..Default::default() },
            items,
            total_amount: Decimal::new(1500, 0),
            payment_method: default_payment_method(),
        }
    }

    #[test]
    fn test_new_order_starts_pending() {
        let item = LineItem { product_id: None, title: "Test Sofa".into(), qty: 3, price: Decimal::new(500, 0) };
        let order = checkout(vec![item]).into_order(Uuid::now_v7(), Utc::now());
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_method, "COD");
    }

    #[test]
    fn test_empty_cart_rejected() {
        assert!(checkout(vec![]).check().is_err());
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let item = LineItem { product_id: None, title: "Test Sofa".into(), qty: 0, price: Decimal::ZERO };
        assert!(checkout(vec![item]).check().is_err());
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_value(OrderStatus::Pending).unwrap(), "Pending");
        assert_eq!(serde_json::to_value(OrderStatus::Shipping).unwrap(), "shipping");
        assert_eq!(OrderStatus::parse("delivered"), Some(OrderStatus::Delivered));
        assert_eq!(OrderStatus::parse("lost"), None);
    }
}
