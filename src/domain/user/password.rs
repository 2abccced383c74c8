//! Password material carried by a record on its way to storage.

use std::fmt;

/// A plaintext password supplied by a caller.
///
/// Never printed: `Debug` and `Display` are redacted so the secret cannot
/// leak through logs or error messages.
#[derive(Clone, PartialEq, Eq)]
pub struct PlaintextPassword(String);

impl PlaintextPassword {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Length in characters, not bytes.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Debug for PlaintextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlaintextPassword(***)")
    }
}

impl fmt::Display for PlaintextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

impl From<&str> for PlaintextPassword {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PlaintextPassword {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// State of the password field of a pending record.
///
/// `Unchanged` keeps the hash the record was loaded with; `NewPlaintext`
/// asks storage preparation to derive a fresh salted hash.
#[derive(Debug, Clone)]
pub enum PasswordField {
    Unchanged(String),
    NewPlaintext(PlaintextPassword),
}

impl PasswordField {
    pub fn is_modified(&self) -> bool {
        matches!(self, Self::NewPlaintext(_))
    }
}
