//! User Aggregate

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub role: Role,
    pub addresses: Vec<Address>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self { Self::Customer => "customer", Self::Admin => "admin" }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value { "customer" => Some(Self::Customer), "admin" => Some(Self::Admin), _ => None }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: Uuid,
    pub street: String,
    pub city: String,
    pub phone: String,
    pub is_default: bool,
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct NewAddress {
    #[validate(length(min = 1))]
    pub street: String,
    #[validate(length(min = 1))]
    pub city: String,
    #[serde(default)]
    pub phone: String,
}

impl User {
    pub fn is_admin(&self) -> bool { self.role == Role::Admin }

    /// Checks a plaintext password against the stored argon2 hash.
    pub fn verify_password(&self, password: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.password_hash) else { return false };
        Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
    }

    /// Newest address goes first. Only the very first address is marked
    /// default; later additions and removals leave the flags alone.
    pub fn push_address(&mut self, address: NewAddress) -> &Address {
        let is_default = self.addresses.is_empty();
        self.addresses.insert(0, Address {
            id: Uuid::now_v7(),
            street: address.street,
            city: address.city,
            phone: address.phone,
            is_default,
        });
        &self.addresses[0]
    }

    /// Unknown ids are ignored.
    pub fn remove_address(&mut self, address_id: Uuid) {
        self.addresses.retain(|a| a.id != address_id);
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            addresses: self.addresses.clone(),
        }
    }
}

/// Public view of a user; never carries the password hash.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub addresses: Vec<Address>,
}

#[derive(Clone, Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

impl NewUser {
    pub fn into_user(self, id: Uuid, now: DateTime<Utc>) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
            addresses: Vec::new(),
            created_at: now,
        }
    }
}

#[derive(Debug, Clone)] pub struct PasswordHashError;
impl std::error::Error for PasswordHashError {}
impl std::fmt::Display for PasswordHashError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "password hashing failed") }
}

/// Salted argon2id hash in PHC string form.
pub fn hash_password(password: &str) -> Result<String, PasswordHashError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| PasswordHashError)
}
