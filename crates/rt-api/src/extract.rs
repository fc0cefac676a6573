use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;
use rt_core::AppError;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ApiError;

/// A `Json<T>` wrapper that turns a missing or undecodable body into
/// `BadRequest("Invalid request")`, the message clients key on.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
            debug!(reason = %e.body_text(), "rejected request body");
            ApiError(AppError::bad_request("Invalid request"))
        })?;
        Ok(AppJson(value))
    }
}
