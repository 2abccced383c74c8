//! User management API handlers
//!
//! Reading a profile is open to the account itself and to admins; role and
//! activity changes are admin-only.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use super::dto::{UpdateRoleRequest, UpdateStatusRequest};
use crate::application::UserService;
use crate::domain::{DomainError, UserRole};
use crate::interfaces::http::common::{ApiError, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::interfaces::http::modules::auth::dto::UserInfo;

#[derive(Clone)]
pub struct UserHandlerState {
    pub users: Arc<UserService>,
}

/// The token's role claim may be stale after a demotion, so admin rights are
/// checked against the stored account.
async fn require_admin(users: &UserService, user: &AuthenticatedUser) -> Result<(), ApiError> {
    match users.get_account(&user.user_id).await {
        Ok(account) if account.role == UserRole::Admin => Ok(()),
        Ok(_) | Err(DomainError::NotFound { .. }) => Err(ApiError::Forbidden),
        Err(e) => Err(e.into()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = ApiResponse<UserInfo>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_user(
    State(state): State<UserHandlerState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<UserInfo> {
    if user.user_id != id {
        require_admin(&state.users, &user).await?;
    }

    let account = state.users.get_account(&id).await?;
    Ok(Json(ApiResponse::success(UserInfo::from(account))))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}/role",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = ApiResponse<UserInfo>),
        (status = 403, description = "Forbidden"),
        (status = 422, description = "Unknown role")
    )
)]
pub async fn update_role(
    State(state): State<UserHandlerState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateRoleRequest>,
) -> ApiResult<UserInfo> {
    require_admin(&state.users, &user).await?;

    let role: UserRole = request.role.parse()?;
    let account = state.users.set_role(&id, role).await?;
    Ok(Json(ApiResponse::success(UserInfo::from(account))))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}/status",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Activity state updated", body = ApiResponse<UserInfo>),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn update_status(
    State(state): State<UserHandlerState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateStatusRequest>,
) -> ApiResult<UserInfo> {
    require_admin(&state.users, &user).await?;

    let account = state.users.set_active(&id, request.is_active).await?;
    Ok(Json(ApiResponse::success(UserInfo::from(account))))
}
