use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use validator::Validate;

use super::TokenService;
use crate::domain::aggregates::{hash_password, NewUser, Role, User, UserProfile};
use crate::repository::{RepositoryError, UserRepository};
use crate::{Result, ShopError};

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// A user's public profile plus a bearer token.
#[derive(Clone, Debug, Serialize)]
pub struct AuthSession {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub token: String,
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: TokenService) -> Self {
        Self { users, tokens }
    }

    fn session(&self, user: &User) -> Result<AuthSession> {
        Ok(AuthSession { profile: user.profile(), token: self.tokens.issue(user.id)? })
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthSession> {
        request.validate()?;
        let email = request.email.trim().to_string();

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(ShopError::EmailTaken);
        }

        let password_hash = hash_password(&request.password).map_err(|e| ShopError::Internal(e.to_string()))?;
        let user = self
            .users
            .create(NewUser { name: request.name.trim().to_string(), email, password_hash, role: Role::Customer })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => ShopError::EmailTaken,
                other => other.into(),
            })?;

        info!(user_id = %user.id, "user registered");
        self.session(&user)
    }

    /// Unknown email and wrong password fail identically.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<AuthSession> {
        let user = self.users.find_by_email(request.email.trim()).await?;
        match user {
            Some(user) if user.verify_password(&request.password) => self.session(&user),
            _ => {
                warn!("login rejected");
                Err(ShopError::InvalidCredentials)
            }
        }
    }

    /// Resolves a bearer token to its user.
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let user_id = self.tokens.verify(token)?;
        self.users.find_by_id(user_id).await?.ok_or(ShopError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::test_utils::{memory_services, test_token_service};

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest { name: "Jane".to_string(), email: email.to_string(), password: "hunter22".to_string() }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (services, repos) = memory_services();

        let session = services.auth.register(register_request("jane@example.com")).await.unwrap();
        assert_eq!(session.profile.role, Role::Customer);

        let stored = repos.users.find_by_email("jane@example.com").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "hunter22");

        let login = services
            .auth
            .login(LoginRequest { email: "jane@example.com".to_string(), password: "hunter22".to_string() })
            .await
            .unwrap();
        assert_eq!(login.profile.id, session.profile.id);

        let me = services.auth.authenticate(&login.token).await.unwrap();
        assert_eq!(me.email, "jane@example.com");
    }

    #[tokio::test]
    async fn test_register_rejects_taken_email_and_bad_input() {
        let (services, _) = memory_services();
        services.auth.register(register_request("jane@example.com")).await.unwrap();

        assert!(matches!(services.auth.register(register_request("jane@example.com")).await, Err(ShopError::EmailTaken)));
        assert!(matches!(services.auth.register(register_request("nope")).await, Err(ShopError::Validation(_))));

        let short = RegisterRequest { password: "12345".to_string(), ..register_request("short@example.com") };
        assert!(matches!(services.auth.register(short).await, Err(ShopError::Validation(_))));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (services, _) = memory_services();
        services.auth.register(register_request("jane@example.com")).await.unwrap();

        let wrong_password = services
            .auth
            .login(LoginRequest { email: "jane@example.com".to_string(), password: "wrong".to_string() })
            .await
            .unwrap_err();
        let unknown = services
            .auth
            .login(LoginRequest { email: "who@example.com".to_string(), password: "hunter22".to_string() })
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, ShopError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_authenticate_rejects_unknown_user() {
        let (services, _) = memory_services();
        let token = test_token_service().issue(Uuid::now_v7()).unwrap();
        assert!(matches!(services.auth.authenticate(&token).await, Err(ShopError::InvalidToken)));
    }
}
