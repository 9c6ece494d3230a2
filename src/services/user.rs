use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::{hash_password, Address, NewAddress, User, UserProfile};
use crate::repository::UserRepository;
use crate::{Result, ShopError};

const USER_NOT_FOUND: &str = "User not found";
const MIN_PASSWORD_LEN: usize = 6;

/// Partial profile update; blank fields are ignored.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub password: Option<String>,
}

pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    async fn load(&self, user_id: Uuid) -> Result<User> {
        self.users.find_by_id(user_id).await?.ok_or_else(|| ShopError::NotFound(USER_NOT_FOUND.to_string()))
    }

    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<UserProfile> {
        let name = update.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        let password_hash = match update.password.filter(|p| !p.is_empty()) {
            Some(password) if password.chars().count() < MIN_PASSWORD_LEN => {
                return Err(ShopError::Validation(format!("password must be at least {MIN_PASSWORD_LEN} characters")));
            }
            Some(password) => Some(hash_password(&password).map_err(|e| ShopError::Internal(e.to_string()))?),
            None => None,
        };

        let user = self
            .users
            .update_profile(user_id, name, password_hash)
            .await?
            .ok_or_else(|| ShopError::NotFound(USER_NOT_FOUND.to_string()))?;
        info!(user_id = %user.id, "profile updated");
        Ok(user.profile())
    }

    #[instrument(skip(self, address))]
    pub async fn add_address(&self, user_id: Uuid, address: NewAddress) -> Result<Vec<Address>> {
        address.validate()?;
        let mut user = self.load(user_id).await?;
        user.push_address(address);
        let user = self
            .users
            .replace_addresses(user_id, user.addresses)
            .await?
            .ok_or_else(|| ShopError::NotFound(USER_NOT_FOUND.to_string()))?;
        Ok(user.addresses)
    }

    #[instrument(skip(self))]
    pub async fn delete_address(&self, user_id: Uuid, address_id: Uuid) -> Result<Vec<Address>> {
        let mut user = self.load(user_id).await?;
        user.remove_address(address_id);
        let user = self
            .users
            .replace_addresses(user_id, user.addresses)
            .await?
            .ok_or_else(|| ShopError::NotFound(USER_NOT_FOUND.to_string()))?;
        Ok(user.addresses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::memory_services;

    fn address(street: &str) -> NewAddress {
        NewAddress { street: street.to_string(), city: "Sydney".to_string(), phone: "0400 000 000".to_string() }
    }

    async fn jane(services: &crate::services::Services) -> UserProfile {
        services
            .auth
            .register(crate::services::RegisterRequest {
                name: "Jane".to_string(),
                email: "jane@example.com".to_string(),
                password: "hunter22".to_string(),
            })
            .await
            .unwrap()
            .profile
    }

    #[tokio::test]
    async fn test_address_defaults() {
        let (services, _) = memory_services();
        let user = jane(&services).await;

        let first = services.users.add_address(user.id, address("1 George St")).await.unwrap();
        assert!(first[0].is_default);

        let both = services.users.add_address(user.id, address("2 Pitt St")).await.unwrap();
        assert_eq!(both[0].street, "2 Pitt St");
        assert!(!both[0].is_default);
        assert!(both[1].is_default);

        let default_id = both[1].id;
        let left = services.users.delete_address(user.id, default_id).await.unwrap();
        assert_eq!(left.len(), 1);
        assert!(left.iter().all(|a| !a.is_default));
    }

    #[tokio::test]
    async fn test_update_profile_rehashes_password() {
        let (services, repos) = memory_services();
        let user = jane(&services).await;

        let profile = services
            .users
            .update_profile(user.id, ProfileUpdate { name: Some("Janet".to_string()), password: Some("newpass1".to_string()) })
            .await
            .unwrap();
        assert_eq!(profile.name, "Janet");

        let stored = repos.users.find_by_id(user.id).await.unwrap().unwrap();
        assert!(stored.verify_password("newpass1"));
        assert!(!stored.verify_password("hunter22"));

        let short = ProfileUpdate { name: None, password: Some("abc".to_string()) };
        assert!(matches!(services.users.update_profile(user.id, short).await, Err(ShopError::Validation(_))));
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let (services, _) = memory_services();
        let ghost = Uuid::now_v7();
        assert!(matches!(services.users.add_address(ghost, address("x")).await, Err(ShopError::NotFound(_))));
        assert!(matches!(services.users.delete_address(ghost, Uuid::now_v7()).await, Err(ShopError::NotFound(_))));
        assert!(matches!(
            services.users.update_profile(ghost, ProfileUpdate::default()).await,
            Err(ShopError::NotFound(_))
        ));
    }
}
