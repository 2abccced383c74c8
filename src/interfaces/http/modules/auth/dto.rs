//! Authentication DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::UserAccount;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 128, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserInfo,
}

/// Field-level rules (name presence, email shape, password length) are
/// enforced by the domain, so absent fields default to empty and get the
/// domain's message. These limits only bound the request size.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(max = 100, message = "first name must be at most 100 characters"))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 100, message = "last name must be at most 100 characters"))]
    pub last_name: String,
    #[serde(default)]
    #[validate(length(max = 255, message = "email must be at most 255 characters"))]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "current password is required"))]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 100, message = "first name must be at most 100 characters"))]
    pub first_name: Option<String>,
    #[validate(length(max = 100, message = "last name must be at most 100 characters"))]
    pub last_name: Option<String>,
    #[validate(length(max = 255, message = "email must be at most 255 characters"))]
    pub email: Option<String>,
}

/// Public view of an account. Never carries password material.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserInfo {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserAccount> for UserInfo {
    fn from(account: UserAccount) -> Self {
        Self {
            id: account.id,
            first_name: account.first_name,
            last_name: account.last_name,
            email: account.email,
            role: account.role.to_string(),
            is_active: account.is_active,
            last_login: account.last_login,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}
