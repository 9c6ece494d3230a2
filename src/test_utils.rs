use rust_decimal::Decimal;
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

use crate::domain::aggregates::{CustomerSnapshot, LineItem, NewOrder, NewProduct};
use crate::repository::Repositories;
use crate::services::{Services, TokenService};

pub(crate) fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}

pub(crate) fn test_token_service() -> TokenService {
    TokenService::new(SecretString::from("test-secret".to_string()), 30)
}

/// Services over fresh in-memory repositories. The repositories are returned
/// too so tests can inspect state directly.
pub(crate) fn memory_services() -> (Services, Repositories) {
    init_test_tracing();
    let repos = Repositories::in_memory();
    (Services::new(repos.clone(), test_token_service()), repos)
}

pub(crate) fn new_product(title: &str, stock: i32) -> NewProduct {
    NewProduct {
        legacy_id: None,
        title: title.to_string(),
        price: Decimal::new(49900, 2),
        description: String::new(),
        category: "Sofas".to_string(),
        image: format!("/images/{}.jpg", title.to_lowercase().replace(' ', "-")),
        count_in_stock: stock,
        rating: None,
        is_best_seller: false,
        dimension_image: None,
        feature_overview: None,
        shipping_info: None,
        warranty_info: None,
        fabrics: Vec::new(),
        model_3d: None,
    }
}

pub(crate) fn customer(email: &str) -> CustomerSnapshot {
    CustomerSnapshot {
        name: "Jane Doe".to_string(),
        email: email.to_string(),
        phone: "0400 000 000".to_string(),
        address: "1 George St".to_string(),
        city: "Sydney".to_string(),
    }
}

/// An order whose lines are keyed by title only.
pub(crate) fn new_order(email: &str, lines: &[(&str, i32)]) -> NewOrder {
    NewOrder {
        customer: customer(email),
        items: lines
            .iter()
            .map(|(title, qty)| LineItem { product_id: None, title: (*title).to_string(), qty: *qty, price: Decimal::new(49900, 2) })
            .collect(),
        total_amount: Decimal::new(49900, 2) * Decimal::from(lines.iter().map(|(_, qty)| *qty).sum::<i32>()),
        payment_method: "COD".to_string(),
    }
}
