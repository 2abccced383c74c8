//! In-memory user repository

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::domain::{
    DomainError, DomainResult, PreparedAccount, StoredCredentials, UserAccount, UserRepository,
};

/// In-memory storage for development and testing.
///
/// Used when no database URL is configured.
pub struct InMemoryUserRepository {
    accounts: DashMap<String, StoredCredentials>,
    /// email -> account id
    emails: DashMap<String, String>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            emails: DashMap::new(),
        }
    }

    fn claim_email(&self, email: &str, id: &str) -> DomainResult<()> {
        match self.emails.entry(email.to_string()) {
            Entry::Occupied(owner) if owner.get() != id => Err(DomainError::Conflict(format!(
                "Email {} already exists",
                email
            ))),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(id.to_string());
                Ok(())
            }
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn save(&self, account: PreparedAccount) -> DomainResult<UserAccount> {
        let now = Utc::now();

        let Some(id) = account.id.clone() else {
            let id = uuid::Uuid::new_v4().to_string();
            self.claim_email(&account.email, &id)?;

            let stored = account.into_stored(id.clone(), now, now);
            let public = stored.account.clone();
            self.accounts.insert(id, stored);
            return Ok(public);
        };

        let mut existing = self
            .accounts
            .get_mut(&id)
            .ok_or_else(|| DomainError::user_not_found(&id))?;

        let previous_email = existing.account.email.clone();
        let email_changed = previous_email != account.email;
        if email_changed {
            self.claim_email(&account.email, &id)?;
        }

        let created_at = existing.account.created_at;
        *existing = account.into_stored(id, created_at, now);
        let public = existing.account.clone();
        drop(existing);

        if email_changed {
            self.emails.remove(&previous_email);
        }

        Ok(public)
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<UserAccount>> {
        Ok(self.accounts.get(id).map(|s| s.account.clone()))
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<UserAccount>> {
        Ok(self
            .find_credentials_by_email(email)
            .await?
            .map(|s| s.account))
    }

    async fn find_credentials_by_id(&self, id: &str) -> DomainResult<Option<StoredCredentials>> {
        Ok(self.accounts.get(id).map(|s| s.clone()))
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> DomainResult<Option<StoredCredentials>> {
        let Some(id) = self.emails.get(email).map(|id| id.clone()) else {
            return Ok(None);
        };
        self.find_credentials_by_id(&id).await
    }

    async fn count(&self) -> DomainResult<u64> {
        Ok(self.accounts.len() as u64)
    }
}
