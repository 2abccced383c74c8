//! Password hashing utilities

use bcrypt::{hash, verify};

use crate::domain::user::MAX_PASSWORD_BYTES;

/// Work factor used when none is configured.
pub const DEFAULT_PASSWORD_COST: u32 = 10;

/// Hash a password using bcrypt with a fresh random salt
pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    hash(password, cost)
}

/// Verify a password against a hash.
///
/// Stored passwords never exceed [`MAX_PASSWORD_BYTES`], so a longer candidate
/// cannot be the same secret even when bcrypt's truncated comparison agrees.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    let matches = verify(password, hash)?;
    Ok(matches && password.len() <= MAX_PASSWORD_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let password = "secure_password_123";
        let hashed = hash_password(password, 4).unwrap();

        assert!(verify_password(password, &hashed).unwrap());
        assert!(!verify_password("wrong_password", &hashed).unwrap());
    }

    #[test]
    fn default_cost_is_encoded_in_hash() {
        let hashed = hash_password("secure_password_123", DEFAULT_PASSWORD_COST).unwrap();
        assert!(hashed.starts_with("$2b$10$"));
    }

    #[test]
    fn candidate_past_bcrypt_limit_does_not_match() {
        let password = "a".repeat(MAX_PASSWORD_BYTES);
        let hashed = hash_password(&password, 4).unwrap();

        assert!(verify_password(&password, &hashed).unwrap());
        assert!(!verify_password(&format!("{}x", password), &hashed).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("anything", "not-a-bcrypt-hash").is_err());
    }
}
