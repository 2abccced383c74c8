pub mod identity;

pub use identity::{AuthResult, CredentialManager, NewAccount, ProfileUpdate, UserService};
