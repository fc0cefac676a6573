//! # rt-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the annotation service.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use rt_core::models::{AnnotationView, RandomImage, SubmitRequest, ValidateRequest, Verdict};
use rt_core::{AnnotationService, AppError};
use serde::Serialize;
use tracing::instrument;

use crate::error::ApiError;
use crate::extract::AppJson;

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AnnotationService>,
    /// Prefix for image URLs, without trailing slash (e.g., "https://turk.example.com")
    pub public_base_url: Arc<str>,
}

impl AppState {
    pub fn new(service: AnnotationService, public_base_url: impl Into<Arc<str>>) -> Self {
        Self {
            service: Arc::new(service),
            public_base_url: public_base_url.into(),
        }
    }
}

/// Characters that cannot appear verbatim in a single URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct FileList {
    pub files: Vec<String>,
}

/// Picks a random image for the next annotation task.
pub async fn random_image(State(state): State<AppState>) -> Result<Json<RandomImage>, ApiError> {
    let image = state.service.random_image().await?;
    Ok(Json(RandomImage {
        image_id: image.id,
        image_url: format!(
            "{}/api/image/{}",
            state.public_base_url,
            utf8_percent_encode(&image.file_name, PATH_SEGMENT)
        ),
    }))
}

/// Streams the raw image file with a content type guessed from its name.
#[instrument(skip(state))]
pub async fn serve_image(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = state.service.image_bytes(&file_name).await?;
    let mime = mime_guess::from_path(&file_name).first_or_octet_stream();

    Response::builder()
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(Body::from(bytes))
        .map_err(|e| ApiError(AppError::internal(e)))
}

#[instrument(skip_all)]
pub async fn submit_annotations(
    State(state): State<AppState>,
    AppJson(req): AppJson<SubmitRequest>,
) -> Result<Json<MessageBody>, ApiError> {
    state.service.submit(req).await?;
    Ok(Json(MessageBody {
        message: "Annotations submitted successfully",
    }))
}

pub async fn list_annotations(
    State(state): State<AppState>,
) -> Result<Json<Vec<AnnotationView>>, ApiError> {
    Ok(Json(state.service.list().await?))
}

/// Runs the render + vision check for one box. Never persists anything.
#[instrument(skip_all)]
pub async fn validate_annotation(
    State(state): State<AppState>,
    AppJson(req): AppJson<ValidateRequest>,
) -> Result<Json<Verdict>, ApiError> {
    Ok(Json(state.service.validate(req).await?))
}

pub async fn list_files(State(state): State<AppState>) -> Result<Json<FileList>, ApiError> {
    let files = state.service.image_files().await?;
    Ok(Json(FileList { files }))
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
