//! # Verify AML/KYC
//!
//! User-account and authentication backend for an AML/KYC verification
//! service: registration, login with bcrypt-hashed passwords, and signed
//! session tokens.
//!
//! ## Architecture
//!
//! - **domain**: Account model, validation rules and repository traits
//! - **application**: Credential handling and account use cases
//! - **infrastructure**: Crypto primitives, SQLite (SeaORM) and in-memory storage
//! - **interfaces**: REST API
//! - **shared**: Graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod shared;

pub use config::{default_config_path, AppConfig, ConfigError};

pub use infrastructure::{init_database, DatabaseConfig};

pub use interfaces::http::{create_api_router, AppState};
