//! Account use cases on top of the user repository
//!
//! HTTP handlers stay thin and delegate here. Every write goes through
//! [`AccountPreparer::prepare_for_storage`] before it reaches the repository.

use std::sync::Arc;

use tracing::info;

use super::credentials::CredentialManager;
use crate::domain::{
    AccountPreparer, DomainError, DomainResult, PasswordField, PendingAccount, PlaintextPassword,
    UserAccount, UserRepository, UserRole,
};

/// Registration input
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: PlaintextPassword,
    pub role: Option<UserRole>,
}

/// Partial profile update; `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

/// Authentication result returned after a successful login
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub account: UserAccount,
}

pub struct UserService {
    repo: Arc<dyn UserRepository>,
    credentials: Arc<CredentialManager>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>, credentials: Arc<CredentialManager>) -> Self {
        Self { repo, credentials }
    }

    pub fn credentials(&self) -> &Arc<CredentialManager> {
        &self.credentials
    }

    // ── Authentication ──────────────────────────────────────────

    /// Check an email/password pair and issue a session token.
    ///
    /// `is_active` is not consulted and `last_login` is not touched here.
    pub async fn login(&self, email: &str, password: &PlaintextPassword) -> DomainResult<AuthResult> {
        let Some(stored) = self.repo.find_credentials_by_email(email).await? else {
            self.credentials.match_unknown_account(password).await;
            return Err(DomainError::Unauthorized("Invalid credentials".into()));
        };

        if !self.credentials.match_password(&stored, password).await? {
            return Err(DomainError::Unauthorized("Invalid credentials".into()));
        }

        let token = self
            .credentials
            .issue_session_token(&stored.account)
            .map_err(|e| DomainError::Crypto(e.to_string()))?;

        info!(user_id = %stored.account.id, "User logged in");

        Ok(AuthResult {
            token,
            token_type: "Bearer".into(),
            expires_in: self.credentials.jwt_config().expiration_secs,
            account: stored.account,
        })
    }

    // ── Registration ────────────────────────────────────────────

    /// Register a new account (default role: analyst).
    pub async fn register(&self, new: NewAccount) -> DomainResult<UserAccount> {
        let pending = PendingAccount::new(
            new.first_name,
            new.last_name,
            new.email,
            new.password,
            new.role.unwrap_or_default(),
        );

        let account = self.store(pending).await?;

        info!(user_id = %account.id, role = %account.role, "New user registered");
        Ok(account)
    }

    /// Create the first admin when the store is empty. Returns `None` if any
    /// account already exists.
    pub async fn ensure_bootstrap_admin(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: PlaintextPassword,
    ) -> DomainResult<Option<UserAccount>> {
        if self.repo.count().await? > 0 {
            return Ok(None);
        }

        let account = self
            .register(NewAccount {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                email: email.to_string(),
                password,
                role: Some(UserRole::Admin),
            })
            .await?;

        Ok(Some(account))
    }

    // ── Queries ─────────────────────────────────────────────────

    pub async fn get_account(&self, id: &str) -> DomainResult<UserAccount> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::user_not_found(id))
    }

    pub async fn find_by_email(&self, email: &str) -> DomainResult<Option<UserAccount>> {
        self.repo.find_by_email(email).await
    }

    // ── Commands (mutations) ────────────────────────────────────

    pub async fn update_profile(&self, id: &str, update: ProfileUpdate) -> DomainResult<UserAccount> {
        let mut pending = self.load_for_update(id).await?;

        if let Some(first_name) = update.first_name {
            pending.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            pending.last_name = last_name;
        }
        if let Some(email) = update.email {
            pending.email = email;
        }

        self.store(pending).await
    }

    /// Change a password after checking the current one.
    pub async fn change_password(
        &self,
        id: &str,
        current: &PlaintextPassword,
        new_password: PlaintextPassword,
    ) -> DomainResult<()> {
        let stored = self
            .repo
            .find_credentials_by_id(id)
            .await?
            .ok_or_else(|| DomainError::user_not_found(id))?;

        if !self.credentials.match_password(&stored, current).await? {
            return Err(DomainError::Unauthorized("Invalid current password".into()));
        }

        let mut pending = PendingAccount::from(stored);
        pending.password = PasswordField::NewPlaintext(new_password);
        self.store(pending).await?;

        info!(user_id = id, "Password changed");
        Ok(())
    }

    pub async fn set_role(&self, id: &str, role: UserRole) -> DomainResult<UserAccount> {
        let mut pending = self.load_for_update(id).await?;
        pending.role = role;

        let account = self.store(pending).await?;
        info!(user_id = id, role = %role, "Role changed");
        Ok(account)
    }

    pub async fn set_active(&self, id: &str, is_active: bool) -> DomainResult<UserAccount> {
        let mut pending = self.load_for_update(id).await?;
        pending.is_active = is_active;

        let account = self.store(pending).await?;
        info!(user_id = id, is_active, "Activity state changed");
        Ok(account)
    }

    // ── Helpers ─────────────────────────────────────────────────

    async fn load_for_update(&self, id: &str) -> DomainResult<PendingAccount> {
        self.repo
            .find_credentials_by_id(id)
            .await?
            .map(PendingAccount::from)
            .ok_or_else(|| DomainError::user_not_found(id))
    }

    async fn store(&self, pending: PendingAccount) -> DomainResult<UserAccount> {
        let prepared = self.credentials.prepare_for_storage(pending).await?;
        self.repo.save(prepared).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::crypto::jwt::JwtConfig;
    use crate::infrastructure::storage::InMemoryUserRepository;

    fn service() -> (UserService, Arc<InMemoryUserRepository>) {
        let repo = Arc::new(InMemoryUserRepository::new());
        let credentials =
            Arc::new(CredentialManager::new(JwtConfig::new("test-secret", 3600)).with_password_cost(4));
        (UserService::new(repo.clone(), credentials), repo)
    }

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: email.into(),
            password: "analytical-engine".into(),
            role: None,
        }
    }

    #[tokio::test]
    async fn register_defaults_to_active_analyst() {
        let (service, _) = service();
        let account = service.register(new_account("ada@example.com")).await.unwrap();

        assert!(!account.id.is_empty());
        assert_eq!(account.role, UserRole::Analyst);
        assert!(account.is_active);
        assert!(account.last_login.is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let (service, _) = service();
        service.register(new_account("ada@example.com")).await.unwrap();

        let err = service.register(new_account("ada@example.com")).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn login_issues_token_for_matching_password() {
        let (service, _) = service();
        let account = service.register(new_account("ada@example.com")).await.unwrap();

        let auth = service
            .login("ada@example.com", &"analytical-engine".into())
            .await
            .unwrap();
        assert_eq!(auth.token_type, "Bearer");
        assert_eq!(auth.expires_in, 3600);

        let claims = service.credentials().verify_session_token(&auth.token).unwrap();
        assert_eq!(claims.sub, account.id);
        assert_eq!(claims.role, UserRole::Analyst);
    }

    #[tokio::test]
    async fn login_rejects_wrong_password_and_unknown_email() {
        let (service, _) = service();
        service.register(new_account("ada@example.com")).await.unwrap();

        let err = service.login("ada@example.com", &"wrong-password".into()).await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));

        let err = service.login("nobody@example.com", &"analytical-engine".into()).await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_look_the_same() {
        let (service, _) = service();
        service.register(new_account("ada@example.com")).await.unwrap();

        let wrong = service.login("ada@example.com", &"wrong-password".into()).await.unwrap_err();
        let unknown = service.login("nobody@example.com", &"wrong-password".into()).await.unwrap_err();
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn login_leaves_activity_fields_alone() {
        let (service, _) = service();
        let account = service.register(new_account("ada@example.com")).await.unwrap();
        service.set_active(&account.id, false).await.unwrap();

        service.login("ada@example.com", &"analytical-engine".into()).await.unwrap();

        let reloaded = service.get_account(&account.id).await.unwrap();
        assert!(!reloaded.is_active);
        assert!(reloaded.last_login.is_none());
    }

    #[tokio::test]
    async fn role_change_keeps_password_hash() {
        let (service, repo) = service();
        let account = service.register(new_account("ada@example.com")).await.unwrap();
        let before = repo.find_credentials_by_id(&account.id).await.unwrap().unwrap();

        let updated = service.set_role(&account.id, UserRole::Auditor).await.unwrap();
        assert_eq!(updated.role, UserRole::Auditor);

        let after = repo.find_credentials_by_id(&account.id).await.unwrap().unwrap();
        assert_eq!(before.password_hash, after.password_hash);
    }

    #[tokio::test]
    async fn change_password_rehashes() {
        let (service, repo) = service();
        let account = service.register(new_account("ada@example.com")).await.unwrap();
        let before = repo.find_credentials_by_id(&account.id).await.unwrap().unwrap();

        let err = service
            .change_password(&account.id, &"not-the-password".into(), "brand-new-secret".into())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));

        service
            .change_password(&account.id, &"analytical-engine".into(), "brand-new-secret".into())
            .await
            .unwrap();

        let after = repo.find_credentials_by_id(&account.id).await.unwrap().unwrap();
        assert_ne!(before.password_hash, after.password_hash);
        assert!(service.login("ada@example.com", &"brand-new-secret".into()).await.is_ok());
        assert!(service.login("ada@example.com", &"analytical-engine".into()).await.is_err());
    }

    #[tokio::test]
    async fn profile_update_validates_email() {
        let (service, _) = service();
        let account = service.register(new_account("ada@example.com")).await.unwrap();

        let err = service
            .update_profile(
                &account.id,
                ProfileUpdate {
                    email: Some("not-an-email".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("email"));

        let updated = service
            .update_profile(
                &account.id,
                ProfileUpdate {
                    last_name: Some("King".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.last_name, "King");
        assert!(updated.updated_at >= account.updated_at);
    }

    #[tokio::test]
    async fn bootstrap_admin_only_when_empty() {
        let (service, _) = service();

        let admin = service
            .ensure_bootstrap_admin("Root", "Admin", "admin@example.com", "change-me-now".into())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, UserRole::Admin);

        let second = service
            .ensure_bootstrap_admin("Root", "Admin", "other@example.com", "change-me-now".into())
            .await
            .unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn missing_account_is_not_found() {
        let (service, _) = service();
        let err = service.set_role("missing", UserRole::Admin).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }
}
