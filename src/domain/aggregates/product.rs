//! Product Aggregate

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domain::value_objects::Rating;

pub const DEFAULT_FEATURE_OVERVIEW: &str = "Galvanised steel frame with a high-resilience seating system.";
pub const DEFAULT_SHIPPING_INFO: &str = "Metro delivery from 8 weeks. Regional delivery from 12 weeks.";
pub const DEFAULT_WARRANTY_INFO: &str = "25 year frame warranty. 10 year foam warranty.";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub legacy_id: Option<i64>,
    pub title: String,
    pub price: Decimal,
    pub description: String,
    pub category: String,
    pub image: String,
    pub count_in_stock: i32,
    pub rating: RatingSummary,
    pub is_best_seller: bool,
    pub dimension_image: Option<String>,
    pub feature_overview: String,
    pub shipping_info: String,
    pub warranty_info: String,
    pub fabrics: Vec<Fabric>,
    #[serde(rename = "model3D")]
    pub model_3d: Option<Model3d>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fabric or leather swatch offered for a product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fabric {
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub extra_price: Decimal,
}

/// 3D assets consumed by the storefront viewer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Model3d {
    pub glb: Option<String>,
    pub usdz: Option<String>,
    pub thumbnail: Option<String>,
}

/// Aggregate of all reviews on a product.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    #[serde(alias = "rate")]
    pub average: f64,
    pub count: i32,
}

impl Default for RatingSummary {
    /// A product nobody has reviewed shows five stars.
    fn default() -> Self { Self { average: 5.0, count: 0 } }
}

impl RatingSummary {
    pub fn from_ratings(ratings: impl IntoIterator<Item = Rating>) -> Self {
        let (sum, count) = ratings.into_iter().fold((0i64, 0i32), |(sum, count), r| (sum + i64::from(r.value()), count + 1));
        if count == 0 { return Self::default(); }
        #[allow(clippy::cast_precision_loss)]
        let average = sum as f64 / f64::from(count);
        Self { average, count }
    }
}

impl Product {
    pub fn take_stock(&mut self, qty: i32) -> Result<(), ProductError> {
        if qty > self.count_in_stock {
            return Err(ProductError::InsufficientStock { available: self.count_in_stock });
        }
        self.count_in_stock -= qty;
        self.touch();
        Ok(())
    }

    pub fn restock(&mut self, qty: i32) {
        self.count_in_stock = self.count_in_stock.saturating_add(qty);
        self.touch();
    }

    pub fn set_stock(&mut self, qty: i32) {
        self.count_in_stock = qty;
        self.touch();
    }

    pub fn set_rating(&mut self, rating: RatingSummary) {
        self.rating = rating;
        self.touch();
    }

    pub fn apply_patch(&mut self, patch: ProductPatch) {
        if let Some(v) = patch.title { self.title = v; }
        if let Some(v) = patch.price { self.price = v; }
        if let Some(v) = patch.description { self.description = v; }
        if let Some(v) = patch.category { self.category = v; }
        if let Some(v) = patch.image { self.image = v; }
        if let Some(v) = patch.count_in_stock { self.count_in_stock = v; }
        if let Some(v) = patch.is_best_seller { self.is_best_seller = v; }
        if let Some(v) = patch.dimension_image { self.dimension_image = Some(v); }
        if let Some(v) = patch.feature_overview { self.feature_overview = v; }
        if let Some(v) = patch.shipping_info { self.shipping_info = v; }
        if let Some(v) = patch.warranty_info { self.warranty_info = v; }
        if let Some(v) = patch.fabrics { self.fabrics = v; }
        if let Some(v) = patch.model_3d { self.model_3d = Some(v); }
        self.touch();
    }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum ProductError { InsufficientStock { available: i32 } }
impl std::error::Error for ProductError {}
impl std::fmt::Display for ProductError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self { Self::InsufficientStock { available } => write!(f, "Insufficient stock (Available: {available})") }
    }
}

pub(crate) fn non_negative_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() { Err(ValidationError::new("negative_price")) } else { Ok(()) }
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub legacy_id: Option<i64>,
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(custom = "non_negative_price")]
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1))]
    pub category: String,
    #[validate(length(min = 1))]
    pub image: String,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub count_in_stock: i32,
    #[serde(default)]
    pub rating: Option<RatingSummary>,
    #[serde(default)]
    pub is_best_seller: bool,
    pub dimension_image: Option<String>,
    pub feature_overview: Option<String>,
    pub shipping_info: Option<String>,
    pub warranty_info: Option<String>,
    #[serde(default)]
    pub fabrics: Vec<Fabric>,
    #[serde(rename = "model3D")]
    pub model_3d: Option<Model3d>,
}

impl NewProduct {
    pub fn into_product(self, id: Uuid, now: DateTime<Utc>) -> Product {
        Product {
            id,
            legacy_id: self.legacy_id,
            title: self.title,
            price: self.price,
            description: self.description,
            category: self.category,
            image: self.image,
            count_in_stock: self.count_in_stock,
            rating: self.rating.unwrap_or_default(),
            is_best_seller: self.is_best_seller,
            dimension_image: self.dimension_image,
            feature_overview: self.feature_overview.unwrap_or_else(|| DEFAULT_FEATURE_OVERVIEW.to_string()),
            shipping_info: self.shipping_info.unwrap_or_else(|| DEFAULT_SHIPPING_INFO.to_string()),
            warranty_info: self.warranty_info.unwrap_or_else(|| DEFAULT_WARRANTY_INFO.to_string()),
            fabrics: self.fabrics,
            model_3d: self.model_3d,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update; absent fields are left untouched.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[validate(length(min = 1))]
    pub title: Option<String>,
    #[validate(custom = "non_negative_price")]
    pub price: Option<Decimal>,
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub category: Option<String>,
    pub image: Option<String>,
    #[validate(range(min = 0))]
    pub count_in_stock: Option<i32>,
    pub is_best_seller: Option<bool>,
    pub dimension_image: Option<String>,
    pub feature_overview: Option<String>,
    pub shipping_info: Option<String>,
    pub warranty_info: Option<String>,
    pub fabrics: Option<Vec<Fabric>>,
    #[serde(rename = "model3D")]
    pub model_3d: Option<Model3d>,
}

/// Catalog listing order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortStrategy {
    PriceAsc,
    PriceDesc,
    Bestseller,
    #[default]
    Newest,
    Oldest,
    RatingDesc,
}

impl SortStrategy {
    /// Unknown keys fall back to newest first.
    pub fn from_key(key: &str) -> Self {
        match key {
            "price_asc" => Self::PriceAsc,
            "price_desc" => Self::PriceDesc,
            "bestseller" => Self::Bestseller,
            "oldest" => Self::Oldest,
            "rating_desc" => Self::RatingDesc,
            _ => Self::Newest,
        }
    }

    pub fn order_by(self) -> &'static str {
        match self {
            Self::PriceAsc => "price ASC, created_at DESC",
            Self::PriceDesc => "price DESC, created_at DESC",
            Self::Bestseller => "is_best_seller DESC, created_at DESC",
            Self::Newest => "created_at DESC",
            Self::Oldest => "created_at ASC",
            Self::RatingDesc => "rating_average DESC, created_at DESC",
        }
    }

    pub fn compare(self, a: &Product, b: &Product) -> Ordering {
        let newest = b.created_at.cmp(&a.created_at);
        match self {
            Self::PriceAsc => a.price.cmp(&b.price).then(newest),
            Self::PriceDesc => b.price.cmp(&a.price).then(newest),
            Self::Bestseller => b.is_best_seller.cmp(&a.is_best_seller).then(newest),
            Self::Newest => newest,
            Self::Oldest => a.created_at.cmp(&b.created_at),
            Self::RatingDesc => b.rating.average.total_cmp(&a.rating.average).then(newest),
        }
    }
}

/// Catalog filter. `category == "all"` is treated as no filter.
#[derive(Clone, Debug, Default)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub keyword: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: SortStrategy,
}

impl ProductQuery {
    pub fn category_filter(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.is_empty() && *c != "all")
    }

    pub fn keyword_filter(&self) -> Option<&str> {
        self.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = self.category_filter() {
            if product.category != category { return false; }
        }
        if let Some(keyword) = self.keyword_filter() {
            if !product.title.to_lowercase().contains(&keyword.to_lowercase()) { return false; }
        }
        if let Some(min) = self.min_price {
            if product.price < min { return false; }
        }
        if let Some(max) = self.max_price {
            if product.price > max { return false; }
        }
        true
    }
}
