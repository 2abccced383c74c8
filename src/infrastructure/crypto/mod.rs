//! Cryptographic primitives: bcrypt password hashing and JWT sessions.

pub mod jwt;
pub mod password;

pub use jwt::{create_token, verify_token, JwtConfig, SessionClaims, TokenError};
pub use password::{hash_password, verify_password, DEFAULT_PASSWORD_COST};
