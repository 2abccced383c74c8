//! User aggregate
//!
//! The account record, its password states, field validation and the
//! persistence/preparation interfaces.

pub mod model;
pub mod password;
pub mod record;
pub mod repository;
pub mod validation;

pub use model::{StoredCredentials, UserAccount, UserRole};
pub use password::{PasswordField, PlaintextPassword};
pub use record::{PendingAccount, PreparedAccount};
pub use repository::{AccountPreparer, UserRepository};
pub use validation::{is_valid_email, validate_pending, MAX_PASSWORD_BYTES, MIN_PASSWORD_LENGTH};
