//! Response envelope, error mapping and request extractors shared by all
//! HTTP modules.

pub mod validated_json;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::domain::DomainError;

pub use validated_json::ValidatedJson;

/// Standard JSON envelope
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Every way a handler can fail, mapped onto a status code in one place.
#[derive(Debug)]
pub enum ApiError {
    Domain(DomainError),
    MalformedJson(JsonRejection),
    InvalidBody(validator::ValidationErrors),
    Unauthenticated(String),
    Forbidden,
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self::Domain(e)
    }
}

impl ApiError {
    fn status_and_message(self) -> (StatusCode, String) {
        match self {
            Self::Domain(e) => match e {
                DomainError::InvalidField { field, message } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, format!("{}: {}", field, message))
                }
                DomainError::Conflict(msg) => (StatusCode::CONFLICT, msg),
                DomainError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
                e @ DomainError::NotFound { .. } => (StatusCode::NOT_FOUND, e.to_string()),
                e @ (DomainError::Storage(_) | DomainError::Crypto(_)) => {
                    error!(error = %e, "Request failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
            },
            Self::MalformedJson(rejection) => {
                (StatusCode::BAD_REQUEST, format!("Invalid JSON: {}", rejection))
            }
            Self::InvalidBody(errors) => {
                let mut field_errors: Vec<String> = errors
                    .field_errors()
                    .iter()
                    .flat_map(|(field, errs)| {
                        errs.iter().map(move |e| {
                            let msg = e
                                .message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string());
                            format!("{}: {}", field, msg)
                        })
                    })
                    .collect();
                field_errors.sort();

                let message = if field_errors.is_empty() {
                    "Validation failed".to_string()
                } else {
                    field_errors.join("; ")
                };
                (StatusCode::UNPROCESSABLE_ENTITY, message)
            }
            Self::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Insufficient permissions".to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;
