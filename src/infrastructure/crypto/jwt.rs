//! JWT Token handling

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::UserRole;

/// Default token lifetime in seconds
pub const DEFAULT_EXPIRATION_SECS: i64 = 3600;

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Token lifetime in seconds
    pub expiration_secs: i64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, expiration_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            expiration_secs,
        }
    }

    pub fn has_secret(&self) -> bool {
        !self.secret.is_empty()
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &if self.has_secret() { "<set>" } else { "<empty>" })
            .field("expiration_secs", &self.expiration_secs)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT signing secret is not configured")]
    MissingSecret,

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// Session claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    /// Subject (account id)
    pub sub: String,
    /// Account role
    pub role: UserRole,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl SessionClaims {
    pub fn new(account_id: &str, role: UserRole, issued_at: DateTime<Utc>, config: &JwtConfig) -> Self {
        let exp = issued_at + Duration::seconds(config.expiration_secs);

        Self {
            sub: account_id.to_string(),
            role,
            iat: issued_at.timestamp(),
            exp: exp.timestamp(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Create a signed token for an account, issued now
pub fn create_token(account_id: &str, role: UserRole, config: &JwtConfig) -> Result<String, TokenError> {
    create_token_at(account_id, role, Utc::now(), config)
}

/// Create a signed token with an explicit issue time
pub fn create_token_at(
    account_id: &str,
    role: UserRole,
    issued_at: DateTime<Utc>,
    config: &JwtConfig,
) -> Result<String, TokenError> {
    if !config.has_secret() {
        return Err(TokenError::MissingSecret);
    }

    let claims = SessionClaims::new(account_id, role, issued_at, config);

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| TokenError::Signing(e.to_string()))
}

/// Verify and decode a token
pub fn verify_token(token: &str, config: &JwtConfig) -> Result<SessionClaims, TokenError> {
    if !config.has_secret() {
        return Err(TokenError::MissingSecret);
    }

    // Expiry is exact; the library default allows 60s past `exp`.
    let mut validation = Validation::default();
    validation.leeway = 0;

    let token_data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid(e.to_string()),
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig::new("test-secret", DEFAULT_EXPIRATION_SECS)
    }

    #[test]
    fn test_create_and_verify_token() {
        let config = config();
        let token = create_token("user-123", UserRole::Auditor, &config).unwrap();

        assert_eq!(token.split('.').count(), 3);

        let claims = verify_token(&token, &config).unwrap();
        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.role, UserRole::Auditor);
        assert_eq!(claims.exp - claims.iat, DEFAULT_EXPIRATION_SECS);
        assert!(!claims.is_expired());
        assert!(!claims.is_admin());
    }

    #[test]
    fn test_invalid_token() {
        let result = verify_token("invalid-token", &config());
        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = config();
        let issued = Utc::now() - Duration::hours(2);
        let token = create_token_at("user-123", UserRole::Analyst, issued, &config).unwrap();

        assert!(matches!(verify_token(&token, &config), Err(TokenError::Expired)));
    }

    #[test]
    fn token_is_rejected_right_after_its_horizon() {
        let config = JwtConfig::new("test-secret", 10);

        let issued = Utc::now() - Duration::seconds(15);
        let token = create_token_at("user-123", UserRole::Analyst, issued, &config).unwrap();
        assert!(matches!(verify_token(&token, &config), Err(TokenError::Expired)));

        let issued = Utc::now() - Duration::seconds(5);
        let token = create_token_at("user-123", UserRole::Analyst, issued, &config).unwrap();
        assert!(verify_token(&token, &config).is_ok());
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let config = config();
        let token = create_token("user-123", UserRole::Analyst, &config).unwrap();

        let forged_claims = SessionClaims::new("user-123", UserRole::Admin, Utc::now(), &config);
        let forged_payload = encode(
            &Header::default(),
            &forged_claims,
            &EncodingKey::from_secret(b"attacker-secret"),
        )
        .unwrap();

        // Original header and signature around the forged payload
        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged_payload.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

        assert!(matches!(verify_token(&spliced, &config), Err(TokenError::Invalid(_))));
        assert!(matches!(
            verify_token(&forged_payload, &config),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_token("user-123", UserRole::Analyst, &config()).unwrap();
        let other = JwtConfig::new("other-secret", DEFAULT_EXPIRATION_SECS);

        assert!(verify_token(&token, &other).is_err());
    }

    #[test]
    fn empty_secret_refuses_to_sign() {
        let config = JwtConfig::new("", DEFAULT_EXPIRATION_SECS);
        let result = create_token("user-123", UserRole::Analyst, &config);

        assert!(matches!(result, Err(TokenError::MissingSecret)));
    }
}
