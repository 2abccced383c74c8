use async_trait::async_trait;

use super::{PendingAccount, PreparedAccount, StoredCredentials, UserAccount};
use crate::domain::DomainResult;

/// Storage preparation every write must pass through.
///
/// Validates the pending record and turns a new plaintext password into a
/// salted hash. Records whose password is unchanged keep their hash.
#[async_trait]
pub trait AccountPreparer: Send + Sync {
    async fn prepare_for_storage(&self, pending: PendingAccount) -> DomainResult<PreparedAccount>;
}

/// Persistence collaborator for user accounts.
///
/// Default lookups return [`UserAccount`] without the password hash; the
/// `*_credentials_*` lookups include it. Implementations enforce email
/// uniqueness and report violations as `DomainError::Conflict`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert when the record has no id yet, otherwise update in place.
    async fn save(&self, account: PreparedAccount) -> DomainResult<UserAccount>;

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<UserAccount>>;
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<UserAccount>>;

    async fn find_credentials_by_id(&self, id: &str) -> DomainResult<Option<StoredCredentials>>;
    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> DomainResult<Option<StoredCredentials>>;

    async fn count(&self) -> DomainResult<u64>;
}
