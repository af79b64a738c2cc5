//! User service
//!
//! Business logic for authentication:
//! - Credential checks and session issuance on login
//! - Session validation with expiry enforcement
//! - Bootstrap of the configured admin account at startup

use anyhow::Result;
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{Session, User, UserRole};
use crate::services::password::{hash_password, verify_password};

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials)
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// User service for authentication and session management
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_ttl_hours: i64,
}

impl UserService {
    /// Create a new user service with the given repositories
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_ttl_hours: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_ttl_hours,
        }
    }

    /// Ensure the configured admin account exists.
    ///
    /// Called once at startup. When the configured password is empty no
    /// account is created and all write endpoints stay locked.
    pub async fn bootstrap_admin(&self, auth: &AuthConfig) -> Result<(), UserServiceError> {
        if auth.admin_password.is_empty() {
            tracing::warn!("No admin password configured; admin login is disabled");
            return Ok(());
        }

        if self
            .user_repo
            .get_by_username(&auth.admin_username)
            .await?
            .is_some()
        {
            return Ok(());
        }

        let hash = hash_password(&auth.admin_password)?;
        let user = User::new(auth.admin_username.clone(), hash, UserRole::Admin);
        self.user_repo.create(&user).await?;
        tracing::info!(username = %auth.admin_username, "Created admin account");
        Ok(())
    }

    /// Verify credentials and open a new session.
    ///
    /// A wrong username and a wrong password produce the same error so the
    /// response does not leak which accounts exist.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, UserServiceError> {
        let Some(user) = self.user_repo.get_by_username(username).await? else {
            return Err(UserServiceError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash)? {
            return Err(UserServiceError::InvalidCredentials);
        }

        let session = Session::new(user.id, self.session_ttl_hours);
        self.session_repo.create(&session).await?;
        tracing::info!(username = %user.username, "User logged in");
        Ok(session)
    }

    /// Close a session. Unknown tokens are ignored.
    pub async fn logout(&self, token: &str) -> Result<(), UserServiceError> {
        self.session_repo.delete(token).await?;
        Ok(())
    }

    /// Resolve a session token to its user.
    ///
    /// Expired sessions are deleted on sight and resolve to `None`, as do
    /// unknown tokens and sessions whose user no longer exists.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let Some(session) = self.session_repo.get(token).await? else {
            return Ok(None);
        };

        if session.is_expired() {
            self.session_repo.delete(token).await?;
            return Ok(None);
        }

        Ok(self.user_repo.get_by_id(session.user_id).await?)
    }

    /// Remove all expired sessions. Returns the number removed.
    pub async fn cleanup_expired_sessions(&self) -> Result<i64, UserServiceError> {
        Ok(self.session_repo.delete_expired().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> UserService {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool),
            168,
        )
    }

    fn auth_config(password: &str) -> AuthConfig {
        AuthConfig {
            admin_username: "gaffer".to_string(),
            admin_password: password.to_string(),
            session_ttl_hours: 168,
        }
    }

    #[tokio::test]
    async fn test_bootstrap_and_login() {
        let service = setup().await;
        service.bootstrap_admin(&auth_config("touchline")).await.unwrap();

        let session = service.login("gaffer", "touchline").await.unwrap();
        let user = service
            .validate_session(&session.token)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.username, "gaffer");
        assert!(user.is_admin());
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let service = setup().await;
        service.bootstrap_admin(&auth_config("touchline")).await.unwrap();
        service.bootstrap_admin(&auth_config("touchline")).await.unwrap();
        assert!(service.login("gaffer", "touchline").await.is_ok());
    }

    #[tokio::test]
    async fn test_bootstrap_without_password_creates_nothing() {
        let service = setup().await;
        service.bootstrap_admin(&auth_config("")).await.unwrap();
        assert!(matches!(
            service.login("gaffer", "").await,
            Err(UserServiceError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let service = setup().await;
        service.bootstrap_admin(&auth_config("touchline")).await.unwrap();
        assert!(matches!(
            service.login("gaffer", "sideline").await,
            Err(UserServiceError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_logout_invalidates_session() {
        let service = setup().await;
        service.bootstrap_admin(&auth_config("touchline")).await.unwrap();

        let session = service.login("gaffer", "touchline").await.unwrap();
        service.logout(&session.token).await.unwrap();
        assert!(service
            .validate_session(&session.token)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_unknown_token_is_none() {
        let service = setup().await;
        assert!(service.validate_session("no-such-token").await.unwrap().is_none());
    }
}
