//! Field rules checked before a record may be written.

use std::sync::LazyLock;

use regex::Regex;

use super::{PasswordField, PendingAccount};
use crate::domain::{DomainError, DomainResult};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// bcrypt only reads the first 72 bytes of its input.
pub const MAX_PASSWORD_BYTES: usize = 72;

// ASCII word characters only; `\w` alone would also accept Unicode letters.
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?-u:\w)+([.-]?(?-u:\w)+)*@(?-u:\w)+([.-]?(?-u:\w)+)*(\.(?-u:\w){2,3})+$")
        .expect("email pattern is a valid regex")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// Check every field rule and return the first violation.
///
/// Names are compared after trimming; callers are expected to have stored the
/// trimmed form already (see [`PendingAccount::normalize`]).
pub fn validate_pending(pending: &PendingAccount) -> DomainResult<()> {
    if pending.first_name.trim().is_empty() {
        return Err(DomainError::invalid("first_name", "Please provide a first name"));
    }
    if pending.last_name.trim().is_empty() {
        return Err(DomainError::invalid("last_name", "Please provide a last name"));
    }

    if pending.email.is_empty() {
        return Err(DomainError::invalid("email", "Please provide an email"));
    }
    if !is_valid_email(&pending.email) {
        return Err(DomainError::invalid("email", "Please provide a valid email"));
    }

    match &pending.password {
        PasswordField::NewPlaintext(secret) if secret.expose().is_empty() => {
            Err(DomainError::invalid("password", "Please provide a password"))
        }
        PasswordField::NewPlaintext(secret) if secret.char_len() < MIN_PASSWORD_LENGTH => {
            Err(DomainError::invalid(
                "password",
                format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
            ))
        }
        PasswordField::NewPlaintext(secret) if secret.expose().len() > MAX_PASSWORD_BYTES => {
            Err(DomainError::invalid(
                "password",
                format!("Password must be at most {} bytes", MAX_PASSWORD_BYTES),
            ))
        }
        PasswordField::Unchanged(hash) if hash.is_empty() => {
            Err(DomainError::invalid("password", "Please provide a password"))
        }
        _ => Ok(()),
    }
}
