//! JSON extractor that also runs `validator::Validate`.
//!
//! Malformed JSON is rejected with 400 and failed validation with 422, both
//! in the standard [`ApiResponse`](super::ApiResponse) envelope.

use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::Validate;

use super::ApiError;

pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ApiError::MalformedJson)?;

        value.validate().map_err(ApiError::InvalidBody)?;

        Ok(ValidatedJson(value))
    }
}
