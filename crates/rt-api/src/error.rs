//! HTTP mapping for [`AppError`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rt_core::AppError;
use serde::Serialize;

/// Body returned by every endpoint on failure.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Newtype so the core error can implement axum's `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let status = match &self.0 {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Render(e) if e.is_structural() => StatusCode::BAD_REQUEST,
            AppError::Render(_) | AppError::ExternalService(_) | AppError::Internal(_) => {
                tracing::error!(error = %self.0, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, ErrorBody { error: self.0.to_string() })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rt_core::RenderError;

    fn status(err: AppError) -> (StatusCode, String) {
        let (status, body) = ApiError(err).status_and_body();
        (status, body.error)
    }

    #[test]
    fn maps_taxonomy_to_status_codes() {
        assert_eq!(
            status(AppError::bad_request("Invalid request")),
            (StatusCode::BAD_REQUEST, "Invalid request".to_string())
        );
        assert_eq!(status(AppError::not_found("Image not found")).0, StatusCode::NOT_FOUND);
        assert_eq!(
            status(RenderError::InvalidBox.into()),
            (StatusCode::BAD_REQUEST, "invalid bounding box".to_string())
        );
        assert_eq!(
            status(RenderError::Encode("boom".into()).into()).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(AppError::ExternalService("timeout".into())),
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "vision service error: timeout".to_string()
            )
        );
    }
}
