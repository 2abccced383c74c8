//! Identity: credentials, sessions and account management
//!
//! `CredentialManager` owns password hashing/verification and session
//! tokens; `UserService` orchestrates the account use-cases on top of it.

pub mod credentials;
pub mod service;

pub use credentials::CredentialManager;
pub use service::{AuthResult, NewAccount, ProfileUpdate, UserService};
