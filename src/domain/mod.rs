pub mod error;
pub mod user;

pub use error::{DomainError, DomainResult};
pub use user::{
    AccountPreparer, PasswordField, PendingAccount, PlaintextPassword, PreparedAccount,
    StoredCredentials, UserAccount, UserRepository, UserRole,
};
