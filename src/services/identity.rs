// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity resolution: password login, bearer tokens, Google profiles and
//! account registration all end in a canonical [`User`].

use crate::db::{find_user_by_login, Repository};
use crate::error::AppError;
use crate::models::User;
use crate::services::password;
use crate::services::token::TokenService;
use std::sync::Arc;

/// Why an identity could not be resolved.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Unauthorized: No token provided")]
    MissingToken,

    #[error("Unauthorized: Invalid token")]
    InvalidToken,

    #[error("Unauthorized: User not found")]
    UserNotFound,

    /// No account matches the login string.
    #[error("No account matches that login")]
    NotFound,

    #[error("Incorrect password")]
    InvalidCredentials,

    #[error("You must provide an email, username and password")]
    Validation,

    #[error("Email or username is already in use")]
    Conflict,

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::MissingToken
            | IdentityError::InvalidToken
            | IdentityError::UserNotFound => AppError::Unauthorized(err.to_string()),
            // Unknown login and wrong password look the same to the client
            IdentityError::NotFound | IdentityError::InvalidCredentials => {
                AppError::InvalidCredentials
            }
            IdentityError::Validation => AppError::Validation(err.to_string()),
            IdentityError::Conflict => AppError::Conflict(err.to_string()),
            IdentityError::Store(inner) => inner,
        }
    }
}

/// Profile attributes returned by a federated identity provider.
#[derive(Debug, Clone)]
pub struct FederatedProfile {
    pub provider_id: String,
    pub display_name: String,
    pub email: String,
}

/// Resolves credentials of every kind to stored users.
#[derive(Clone)]
pub struct IdentityService {
    db: Arc<dyn Repository>,
    tokens: TokenService,
}

impl IdentityService {
    pub fn new(db: Arc<dyn Repository>, tokens: TokenService) -> Self {
        Self { db, tokens }
    }

    /// Mint a fresh access token for `user`.
    pub fn issue_token(&self, user: &User) -> Result<String, IdentityError> {
        self.tokens
            .issue(user)
            .map_err(|e| IdentityError::Store(AppError::Internal(anyhow::anyhow!(e))))
    }

    /// Password path: `login` matches email (case-insensitive) or username.
    pub async fn login(&self, login: &str, password: &str) -> Result<User, IdentityError> {
        let user = find_user_by_login(self.db.as_ref(), login)
            .await?
            .ok_or(IdentityError::NotFound)?;

        let (user, valid) =
            password::validate_password_blocking(user, password.to_string()).await?;
        if !valid {
            tracing::info!(user_id = %user.id, "Login rejected: incorrect password");
            return Err(IdentityError::InvalidCredentials);
        }

        Ok(user.without_credentials())
    }

    /// Token path: decode a bearer token and load its subject.
    pub async fn resolve_token(&self, token: Option<&str>) -> Result<User, IdentityError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(IdentityError::MissingToken)?;

        let claims = self
            .tokens
            .decode(token)
            .map_err(|_| IdentityError::InvalidToken)?;

        let user = self
            .db
            .get_user(&claims.sub)
            .await?
            .ok_or(IdentityError::UserNotFound)?;

        Ok(user.without_credentials())
    }

    /// Federated path: find the account linked to a provider ID, creating it on first login.
    pub async fn resolve_federated(
        &self,
        profile: &FederatedProfile,
    ) -> Result<User, IdentityError> {
        if let Some(user) = self.db.find_user_by_google_id(&profile.provider_id).await? {
            return Ok(user.without_credentials());
        }

        let mut user = User::new(&profile.email, &profile.display_name);
        user.google_id = Some(profile.provider_id.clone());

        match self.db.insert_user(&user).await {
            Ok(()) => {
                tracing::info!(user_id = %user.id, "Provisioned account from Google sign-in");
                Ok(user)
            }
            Err(AppError::Conflict(_)) => {
                // Either a concurrent first login won, or the email/username belongs
                // to another account. Only the first case resolves.
                self.db
                    .find_user_by_google_id(&profile.provider_id)
                    .await?
                    .map(User::without_credentials)
                    .ok_or(IdentityError::Conflict)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Register a password account and return its first access token.
    pub async fn create_account(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<String, IdentityError> {
        if email.trim().is_empty() || username.trim().is_empty() || password.is_empty() {
            return Err(IdentityError::Validation);
        }

        let user =
            password::set_password_blocking(User::new(email, username), password.to_string())
                .await?;

        // Uniqueness is decided by the store's insert, not a prior lookup
        match self.db.insert_user(&user).await {
            Ok(()) => {}
            Err(AppError::Conflict(_)) => return Err(IdentityError::Conflict),
            Err(e) => return Err(e.into()),
        }

        tracing::info!(user_id = %user.id, "Account created");
        self.issue_token(&user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryDb, UserStore};

    fn service() -> (IdentityService, MemoryDb) {
        let db = MemoryDb::new();
        let tokens = TokenService::new(b"test_token_secret_32_bytes_long!");
        (IdentityService::new(Arc::new(db.clone()), tokens), db)
    }

    fn google_profile(id: &str) -> FederatedProfile {
        FederatedProfile {
            provider_id: id.to_string(),
            display_name: "Jane Lifter".to_string(),
            email: "Jane@Example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_account_then_login_by_either_field() {
        let (service, _) = service();
        let token = service.create_account("a@x.com", "a", "p").await.unwrap();
        assert!(!token.is_empty());

        let by_username = service.login("a", "p").await.unwrap();
        assert_eq!(by_username.email, "a@x.com");
        assert!(by_username.hash.is_none());

        let by_email = service.login("A@X.com", "p").await.unwrap();
        assert_eq!(by_email.username, "a");
    }

    #[tokio::test]
    async fn test_username_whitespace_is_trimmed() {
        let (service, db) = service();
        service.create_account("a@x.com", " a ", "p").await.unwrap();

        let user = service.login("a", "p").await.unwrap();
        assert_eq!(user.username, "a");
        assert!(service.login(" a ", "p").await.is_ok());

        // Padding does not make a second account with the same name
        assert!(matches!(
            service.create_account("b@x.com", "a  ", "p").await,
            Err(IdentityError::Conflict)
        ));
        assert_eq!(db.user_count(), 1);
    }

    #[tokio::test]
    async fn test_login_failures() {
        let (service, _) = service();
        service.create_account("a@x.com", "a", "p").await.unwrap();

        assert!(matches!(
            service.login("a", "wrong").await,
            Err(IdentityError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login("nobody", "p").await,
            Err(IdentityError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_create_account_validation_skips_storage() {
        let (service, db) = service();
        for (email, username, password) in [("", "a", "p"), ("a@x.com", "", "p"), ("a@x.com", "a", "")]
        {
            assert!(matches!(
                service.create_account(email, username, password).await,
                Err(IdentityError::Validation)
            ));
        }
        assert_eq!(db.user_count(), 0);
    }

    #[tokio::test]
    async fn test_create_account_conflicts() {
        let (service, db) = service();
        service.create_account("a@x.com", "a", "p").await.unwrap();

        assert!(matches!(
            service.create_account("A@x.com", "other", "p").await,
            Err(IdentityError::Conflict)
        ));
        assert!(matches!(
            service.create_account("other@x.com", "a", "p").await,
            Err(IdentityError::Conflict)
        ));
        assert_eq!(db.user_count(), 1);
    }

    #[tokio::test]
    async fn test_resolve_token_paths() {
        let (service, db) = service();
        let token = service.create_account("a@x.com", "a", "p").await.unwrap();

        let user = service.resolve_token(Some(&token)).await.unwrap();
        assert_eq!(user.username, "a");
        assert!(user.salt.is_none() && user.hash.is_none());

        assert!(matches!(
            service.resolve_token(None).await,
            Err(IdentityError::MissingToken)
        ));
        assert!(matches!(
            service.resolve_token(Some("garbage")).await,
            Err(IdentityError::InvalidToken)
        ));

        // Valid signature, but the subject was never stored
        let ghost = service.issue_token(&User::new("g@x.com", "g")).unwrap();
        assert!(matches!(
            service.resolve_token(Some(&ghost)).await,
            Err(IdentityError::UserNotFound)
        ));
        assert_eq!(db.user_count(), 1);
    }

    #[tokio::test]
    async fn test_federated_provisions_once() {
        let (service, db) = service();

        let first = service.resolve_federated(&google_profile("g-1")).await.unwrap();
        assert_eq!(first.email, "jane@example.com");
        assert_eq!(first.username, "Jane Lifter");
        assert_eq!(first.google_id.as_deref(), Some("g-1"));
        assert!(!first.has_password());

        let second = service.resolve_federated(&google_profile("g-1")).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(db.user_count(), 1);
    }

    #[tokio::test]
    async fn test_federated_email_taken_by_password_account() {
        let (service, db) = service();
        service
            .create_account("jane@example.com", "jane", "p")
            .await
            .unwrap();

        assert!(matches!(
            service.resolve_federated(&google_profile("g-2")).await,
            Err(IdentityError::Conflict)
        ));
        assert_eq!(db.user_count(), 1);
        assert!(db.find_user_by_google_id("g-2").await.unwrap().is_none());
    }

    #[test]
    fn test_error_mapping() {
        assert!(matches!(
            AppError::from(IdentityError::MissingToken),
            AppError::Unauthorized(msg) if msg == "Unauthorized: No token provided"
        ));
        assert!(matches!(
            AppError::from(IdentityError::NotFound),
            AppError::InvalidCredentials
        ));
        assert!(matches!(
            AppError::from(IdentityError::Conflict),
            AppError::Conflict(_)
        ));
    }
}
