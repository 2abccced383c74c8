//! Bearer-token authentication middleware for Axum

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::common::ApiError;
use crate::application::CredentialManager;
use crate::domain::UserRole;
use crate::infrastructure::crypto::jwt::{SessionClaims, TokenError};

/// Authentication state
#[derive(Clone)]
pub struct AuthState {
    pub credentials: Arc<CredentialManager>,
}

/// Caller identity taken from a verified session token
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub role: UserRole,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
        }
    }
}

fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Require a valid session token; inserts [`AuthenticatedUser`] into the
/// request extensions.
pub async fn auth_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(auth_header) = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    else {
        return ApiError::Unauthenticated("Missing authentication token".into()).into_response();
    };

    let Some(token) = extract_bearer(auth_header) else {
        return ApiError::Unauthenticated("Invalid authentication token".into()).into_response();
    };

    match auth_state.credentials.verify_session_token(token) {
        Ok(claims) => {
            request
                .extensions_mut()
                .insert(AuthenticatedUser::from_claims(claims));
            next.run(request).await
        }
        Err(TokenError::Expired) => {
            ApiError::Unauthenticated("Token has expired".into()).into_response()
        }
        Err(_) => ApiError::Unauthenticated("Invalid authentication token".into()).into_response(),
    }
}
