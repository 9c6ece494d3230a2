//! Value Objects for the storefront

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Coupon code value object. Codes are stored trimmed and uppercased so
/// lookups are case-insensitive.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CouponCode(String);

impl CouponCode {
    pub const MAX_LEN: usize = 32;

    pub fn new(value: impl Into<String>) -> Result<Self, CouponCodeError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() { return Err(CouponCodeError::Empty); }
        if value.chars().count() > Self::MAX_LEN { return Err(CouponCodeError::TooLong); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl TryFrom<String> for CouponCode {
    type Error = CouponCodeError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<CouponCode> for String {
    fn from(code: CouponCode) -> Self { code.0 }
}

#[derive(Debug, Clone)] pub enum CouponCodeError { Empty, TooLong }
impl std::error::Error for CouponCodeError {}
impl fmt::Display for CouponCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Empty => write!(f, "coupon code empty"), Self::TooLong => write!(f, "coupon code too long") }
    }
}

/// Star rating on a review, 1 through 5 inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub struct Rating(i16);

impl Rating {
    pub const MIN: i16 = 1;
    pub const MAX: i16 = 5;

    pub fn new(value: i16) -> Result<Self, RatingError> {
        if (Self::MIN..=Self::MAX).contains(&value) { Ok(Self(value)) } else { Err(RatingError(value)) }
    }
    pub fn value(self) -> i16 { self.0 }
}

impl TryFrom<i16> for Rating {
    type Error = RatingError;
    fn try_from(value: i16) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<Rating> for i16 {
    fn from(rating: Rating) -> Self { rating.0 }
}

#[derive(Debug, Clone)] pub struct RatingError(pub i16);
impl std::error::Error for RatingError {}
impl fmt::Display for RatingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rating must be between {} and {}, got {}", Rating::MIN, Rating::MAX, self.0)
    }
}

/// How a caller refers to a product: the generated id, or the numeric id
/// carried over from the pre-migration catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProductRef {
    Id(Uuid),
    Legacy(i64),
}

impl FromStr for ProductRef {
    type Err = ProductRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(id) = Uuid::parse_str(s) { return Ok(Self::Id(id)); }
        s.parse::<i64>().map(Self::Legacy).map_err(|_| ProductRefError(s.to_string()))
    }
}

impl From<Uuid> for ProductRef {
    fn from(id: Uuid) -> Self { Self::Id(id) }
}

impl fmt::Display for ProductRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Id(id) => write!(f, "{id}"), Self::Legacy(n) => write!(f, "{n}") }
    }
}

#[derive(Debug, Clone)] pub struct ProductRefError(pub String);
impl std::error::Error for ProductRefError {}
impl fmt::Display for ProductRefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "not a product id: {}", self.0) }
}
