use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Access role of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UserRole {
    Admin,
    ComplianceOfficer,
    #[default]
    Analyst,
    Auditor,
}

impl UserRole {
    pub const ALL: [UserRole; 4] = [
        UserRole::Admin,
        UserRole::ComplianceOfficer,
        UserRole::Analyst,
        UserRole::Auditor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::ComplianceOfficer => "compliance-officer",
            Self::Analyst => "analyst",
            Self::Auditor => "auditor",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| {
                DomainError::invalid(
                    "role",
                    "Role must be one of admin, compliance-officer, analyst, auditor",
                )
            })
    }
}

/// Account record as returned by default reads. Carries no password material.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserAccount {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account loaded together with its password hash.
///
/// Only the explicit "with credentials" repository lookups return this.
#[derive(Clone)]
pub struct StoredCredentials {
    pub account: UserAccount,
    pub password_hash: String,
}

impl fmt::Debug for StoredCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCredentials")
            .field("account", &self.account)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_only_enumerated_values() {
        for role in UserRole::ALL {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }

        let err = "manager".parse::<UserRole>().unwrap_err();
        assert_eq!(err.field(), Some("role"));
        assert!("Admin".parse::<UserRole>().is_err());
    }

    #[test]
    fn role_defaults_to_analyst() {
        assert_eq!(UserRole::default(), UserRole::Analyst);
    }

    #[test]
    fn role_serializes_kebab_case() {
        let json = serde_json::to_string(&UserRole::ComplianceOfficer).unwrap();
        assert_eq!(json, "\"compliance-officer\"");

        let parsed: UserRole = serde_json::from_str("\"auditor\"").unwrap();
        assert_eq!(parsed, UserRole::Auditor);
        assert!(serde_json::from_str::<UserRole>("\"manager\"").is_err());
    }
}
