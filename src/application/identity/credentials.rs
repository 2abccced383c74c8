//! Credential & session manager
//!
//! Owns the three operations the rest of the service builds on:
//! finalizing a record's password before it is written, checking a candidate
//! password against a stored hash, and issuing signed session tokens.
//!
//! bcrypt is deliberately slow, so hashing and verification run on the
//! blocking thread pool instead of the async executor.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tokio::task;
use tracing::debug;

use crate::domain::{
    user::validate_pending, AccountPreparer, DomainError, DomainResult, PasswordField,
    PendingAccount, PlaintextPassword, PreparedAccount, StoredCredentials, UserAccount,
};
use crate::infrastructure::crypto::jwt::{
    create_token, verify_token, JwtConfig, SessionClaims, TokenError,
};
use crate::infrastructure::crypto::password::{
    hash_password, verify_password, DEFAULT_PASSWORD_COST,
};

#[derive(Debug, Clone)]
pub struct CredentialManager {
    jwt_config: JwtConfig,
    password_cost: u32,
    /// Hash verified against when no account exists, so a miss costs the
    /// same bcrypt work as a wrong password.
    decoy_hash: Arc<OnceLock<String>>,
}

impl CredentialManager {
    pub fn new(jwt_config: JwtConfig) -> Self {
        Self {
            jwt_config,
            password_cost: DEFAULT_PASSWORD_COST,
            decoy_hash: Arc::new(OnceLock::new()),
        }
    }

    /// Override the bcrypt work factor.
    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }

    pub fn jwt_config(&self) -> &JwtConfig {
        &self.jwt_config
    }

    pub fn password_cost(&self) -> u32 {
        self.password_cost
    }

    /// True iff `candidate` reproduces the stored hash. A mismatch is
    /// `Ok(false)`; only a corrupt stored hash is an error.
    pub async fn match_password(
        &self,
        credentials: &StoredCredentials,
        candidate: &PlaintextPassword,
    ) -> DomainResult<bool> {
        let hash = credentials.password_hash.clone();
        let candidate = candidate.clone();

        task::spawn_blocking(move || verify_password(candidate.expose(), &hash))
            .await
            .map_err(|e| DomainError::Crypto(format!("Password verification task failed: {}", e)))?
            .map_err(|e| DomainError::Crypto(format!("Failed to verify password: {}", e)))
    }

    /// Spend one verification's worth of bcrypt work for a login whose email
    /// has no account. Always `false`.
    pub async fn match_unknown_account(&self, candidate: &PlaintextPassword) -> bool {
        let decoy = Arc::clone(&self.decoy_hash);
        let cost = self.password_cost;
        let candidate = candidate.clone();

        let _ = task::spawn_blocking(move || {
            let hash = decoy.get_or_init(|| {
                hash_password("decoy-password-never-issued", cost).unwrap_or_default()
            });
            verify_password(candidate.expose(), hash)
        })
        .await;

        false
    }

    /// Sign a session token carrying the account id and role.
    pub fn issue_session_token(&self, account: &UserAccount) -> Result<String, TokenError> {
        create_token(&account.id, account.role, &self.jwt_config)
    }

    pub fn verify_session_token(&self, token: &str) -> Result<SessionClaims, TokenError> {
        verify_token(token, &self.jwt_config)
    }

    async fn derive_hash(&self, secret: PlaintextPassword) -> DomainResult<String> {
        let cost = self.password_cost;

        task::spawn_blocking(move || hash_password(secret.expose(), cost))
            .await
            .map_err(|e| DomainError::Crypto(format!("Password hashing task failed: {}", e)))?
            .map_err(|e| DomainError::Crypto(format!("Failed to hash password: {}", e)))
    }
}

#[async_trait]
impl AccountPreparer for CredentialManager {
    async fn prepare_for_storage(&self, mut pending: PendingAccount) -> DomainResult<PreparedAccount> {
        pending.normalize();
        validate_pending(&pending)?;

        let password_hash = match &pending.password {
            PasswordField::Unchanged(hash) => hash.clone(),
            PasswordField::NewPlaintext(secret) => {
                debug!(account_id = ?pending.id, "Hashing new password");
                self.derive_hash(secret.clone()).await?
            }
        };

        Ok(PreparedAccount::from_pending(pending, password_hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::domain::UserRole;

    fn manager() -> CredentialManager {
        CredentialManager::new(JwtConfig::new("test-secret", 3600)).with_password_cost(4)
    }

    fn pending(password: &str) -> PendingAccount {
        PendingAccount::new("Grace", "Hopper", "grace@navy.mil", password, UserRole::Analyst)
    }

    fn stored(prepared: PreparedAccount) -> StoredCredentials {
        let now = Utc::now();
        prepared.into_stored("acc-1".into(), now, now)
    }

    #[tokio::test]
    async fn prepared_password_matches_only_itself() {
        let manager = manager();
        let prepared = manager.prepare_for_storage(pending("correct horse")).await.unwrap();

        assert_ne!(prepared.password_hash(), "correct horse");
        let creds = stored(prepared);

        assert!(manager.match_password(&creds, &"correct horse".into()).await.unwrap());
        assert!(!manager.match_password(&creds, &"correct horsex".into()).await.unwrap());
    }

    #[tokio::test]
    async fn bcrypt_truncation_does_not_leak_into_matching() {
        let manager = manager();
        let secret = "a".repeat(72);
        let creds = stored(manager.prepare_for_storage(pending(&secret)).await.unwrap());

        assert!(manager.match_password(&creds, &secret.as_str().into()).await.unwrap());
        let longer = format!("{}x", secret);
        assert!(!manager.match_password(&creds, &longer.into()).await.unwrap());
    }

    #[tokio::test]
    async fn multibyte_password_over_72_bytes_is_rejected() {
        let manager = manager();
        let err = manager
            .prepare_for_storage(pending(&"ж".repeat(40)))
            .await
            .unwrap_err();

        assert_eq!(err.field(), Some("password"));
    }

    #[tokio::test]
    async fn unknown_account_costs_a_verification() {
        let manager = manager();
        assert!(manager.decoy_hash.get().is_none());

        assert!(!manager.match_unknown_account(&"correct horse".into()).await);

        let decoy = manager.decoy_hash.get().unwrap();
        assert!(decoy.starts_with("$2b$04$"));
    }

    #[tokio::test]
    async fn unchanged_password_is_idempotent() {
        let manager = manager();
        let first = stored(manager.prepare_for_storage(pending("correct horse")).await.unwrap());
        let original_hash = first.password_hash.clone();

        let again = manager.prepare_for_storage(first.into()).await.unwrap();
        assert_eq!(again.password_hash(), original_hash);

        let third = manager.prepare_for_storage(stored(again).into()).await.unwrap();
        assert_eq!(third.password_hash(), original_hash);
    }

    #[tokio::test]
    async fn same_plaintext_yields_distinct_hashes() {
        let manager = manager();
        let a = manager.prepare_for_storage(pending("same-password")).await.unwrap();
        let b = manager.prepare_for_storage(pending("same-password")).await.unwrap();

        assert_ne!(a.password_hash(), b.password_hash());
    }

    #[tokio::test]
    async fn default_work_factor_is_ten() {
        let manager = CredentialManager::new(JwtConfig::new("test-secret", 3600));
        let prepared = manager.prepare_for_storage(pending("correct horse")).await.unwrap();

        assert!(prepared.password_hash().starts_with("$2b$10$"));
    }

    #[tokio::test]
    async fn invalid_record_is_rejected_before_hashing() {
        let manager = manager();

        let mut bad_email = pending("correct horse");
        bad_email.email = "not-an-email".into();
        let err = manager.prepare_for_storage(bad_email).await.unwrap_err();
        assert_eq!(err.field(), Some("email"));

        let err = manager.prepare_for_storage(pending("short")).await.unwrap_err();
        assert_eq!(err.field(), Some("password"));
    }

    #[tokio::test]
    async fn names_are_trimmed() {
        let manager = manager();
        let mut record = pending("correct horse");
        record.first_name = "  Grace ".into();

        let creds = stored(manager.prepare_for_storage(record).await.unwrap());
        assert_eq!(creds.account.first_name, "Grace");
    }

    #[tokio::test]
    async fn corrupt_hash_is_an_error_not_a_mismatch() {
        let manager = manager();
        let mut creds = stored(manager.prepare_for_storage(pending("correct horse")).await.unwrap());
        creds.password_hash = "garbage".into();

        let result = manager.match_password(&creds, &"correct horse".into()).await;
        assert!(matches!(result, Err(DomainError::Crypto(_))));
    }

    #[tokio::test]
    async fn session_token_carries_id_and_role() {
        let manager = manager();
        let mut record = pending("correct horse");
        record.role = UserRole::ComplianceOfficer;
        let creds = stored(manager.prepare_for_storage(record).await.unwrap());

        let token = manager.issue_session_token(&creds.account).unwrap();
        let claims = manager.verify_session_token(&token).unwrap();

        assert_eq!(claims.sub, "acc-1");
        assert_eq!(claims.role, UserRole::ComplianceOfficer);
    }
}
