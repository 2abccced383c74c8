use chrono::{DateTime, Utc};

use super::{PasswordField, PlaintextPassword, StoredCredentials, UserAccount, UserRole};

/// A record on its way to storage, before its password has been finalized.
#[derive(Debug, Clone)]
pub struct PendingAccount {
    /// `None` until the repository assigns one on first save.
    pub id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: PasswordField,
    pub role: UserRole,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl PendingAccount {
    /// A brand-new account with a plaintext password.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<PlaintextPassword>,
        role: UserRole,
    ) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            password: PasswordField::NewPlaintext(password.into()),
            role,
            is_active: true,
            last_login: None,
            created_at: None,
        }
    }

    /// Trim surrounding whitespace from the name fields.
    pub fn normalize(&mut self) {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
    }
}

impl From<StoredCredentials> for PendingAccount {
    /// Start an update from a loaded record; the password stays `Unchanged`.
    fn from(stored: StoredCredentials) -> Self {
        let account = stored.account;
        Self {
            id: Some(account.id),
            first_name: account.first_name,
            last_name: account.last_name,
            email: account.email,
            password: PasswordField::Unchanged(stored.password_hash),
            role: account.role,
            is_active: account.is_active,
            last_login: account.last_login,
            created_at: Some(account.created_at),
        }
    }
}

/// A validated record whose password field holds a hash.
///
/// Repositories accept nothing else for writes, and the only constructor is
/// crate-private, reached through [`super::AccountPreparer`].
#[derive(Clone)]
pub struct PreparedAccount {
    pub(crate) id: Option<String>,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) email: String,
    pub(crate) password_hash: String,
    pub(crate) role: UserRole,
    pub(crate) is_active: bool,
    pub(crate) last_login: Option<DateTime<Utc>>,
    pub(crate) created_at: Option<DateTime<Utc>>,
}

impl PreparedAccount {
    pub(crate) fn from_pending(pending: PendingAccount, password_hash: String) -> Self {
        Self {
            id: pending.id,
            first_name: pending.first_name,
            last_name: pending.last_name,
            email: pending.email,
            password_hash,
            role: pending.role,
            is_active: pending.is_active,
            last_login: pending.last_login,
            created_at: pending.created_at,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    /// Materialize the stored form once the repository has fixed the
    /// identifier and timestamps.
    pub fn into_stored(
        self,
        id: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> StoredCredentials {
        StoredCredentials {
            account: UserAccount {
                id,
                first_name: self.first_name,
                last_name: self.last_name,
                email: self.email,
                role: self.role,
                is_active: self.is_active,
                last_login: self.last_login,
                created_at,
                updated_at,
            },
            password_hash: self.password_hash,
        }
    }
}

impl std::fmt::Debug for PreparedAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedAccount")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}
