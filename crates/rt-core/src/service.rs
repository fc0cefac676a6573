//! # Annotation Service
//!
//! Orchestrates the ports: validates inbound requests, then hands work to the
//! repositories, the image store, the renderer and the vision verifier.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::error::{AppError, RenderError, Result};
use crate::models::{
    AnnotationView, BoundingBox, Image, NewAnnotation, SubmitRequest, ValidateRequest, Verdict,
};
use crate::traits::{AnnotationRepo, ImageRepo, ImageStore, OverlayRenderer, VisionVerifier};

pub struct AnnotationService {
    images: Arc<dyn ImageRepo>,
    annotations: Arc<dyn AnnotationRepo>,
    files: Arc<dyn ImageStore>,
    renderer: Arc<dyn OverlayRenderer>,
    verifier: Arc<dyn VisionVerifier>,
}

impl AnnotationService {
    pub fn new(
        images: Arc<dyn ImageRepo>,
        annotations: Arc<dyn AnnotationRepo>,
        files: Arc<dyn ImageStore>,
        renderer: Arc<dyn OverlayRenderer>,
        verifier: Arc<dyn VisionVerifier>,
    ) -> Self {
        Self {
            images,
            annotations,
            files,
            renderer,
            verifier,
        }
    }

    pub async fn random_image(&self) -> Result<Image> {
        self.images.random_image().await
    }

    pub async fn image_bytes(&self, file_name: &str) -> Result<Vec<u8>> {
        self.files.read_bytes(file_name).await
    }

    pub async fn image_files(&self) -> Result<Vec<String>> {
        self.files.list_files().await
    }

    /// Validates a submission batch and persists it atomically.
    ///
    /// Returns the number of annotations stored.
    #[instrument(skip_all, fields(worker_id = tracing::field::Empty))]
    pub async fn submit(&self, req: SubmitRequest) -> Result<usize> {
        let (worker_id, inputs) = match (req.worker_id, req.annotations) {
            (Some(worker_id), Some(inputs)) => (worker_id, inputs),
            _ => return Err(AppError::bad_request("Invalid request")),
        };
        tracing::Span::current().record("worker_id", worker_id.as_str());

        if inputs.is_empty() {
            return Err(AppError::bad_request("No annotations received"));
        }

        // The whole batch is checked before anything reaches the repository.
        let batch = inputs
            .into_iter()
            .map(|input| -> Result<NewAnnotation> {
                let invalid = || AppError::bad_request("Invalid annotation format");
                let (Some(image_id), Some(raw_boxes)) = (input.image_id, input.bounding_boxes)
                else {
                    return Err(invalid());
                };
                let boxes = raw_boxes
                    .into_iter()
                    .map(serde_json::from_value::<BoundingBox>)
                    .collect::<serde_json::Result<Vec<_>>>()
                    .map_err(|e| {
                        debug!(error = %e, "rejecting malformed box");
                        invalid()
                    })?;
                Ok(NewAnnotation { image_id, boxes })
            })
            .collect::<Result<Vec<_>>>()?;

        let ids = self.annotations.insert_many(&worker_id, &batch).await?;
        info!(count = ids.len(), "annotations stored");
        Ok(ids.len())
    }

    pub async fn list(&self) -> Result<Vec<AnnotationView>> {
        let annotations = self.annotations.list_all().await?;
        Ok(annotations.into_iter().map(AnnotationView::from).collect())
    }

    /// Renders the box over the stored image and asks the vision model to judge it.
    ///
    /// Nothing is persisted on any path.
    #[instrument(skip_all, fields(image_id = ?req.image_id))]
    pub async fn validate(&self, req: ValidateRequest) -> Result<Verdict> {
        let (image_id, raw_box) = match (req.image_id, req.bounding_box) {
            (Some(id), Some(b)) => (id, b),
            _ => return Err(AppError::bad_request("Missing image_id or bounding_box")),
        };

        let bbox = raw_box
            .iter()
            .map(|v| v.as_f64())
            .collect::<Option<Vec<f64>>>()
            .filter(|b| b.len() == 4)
            .ok_or_else(|| {
                AppError::bad_request("bounding_box must contain exactly 4 numeric values")
            })?;

        let image = match self.images.get_image(image_id).await {
            Err(AppError::NotFound(_)) => return Err(AppError::not_found("Image not found")),
            other => other?,
        };

        // A row whose file has vanished renders as an unreadable image.
        let bytes = match self.files.read_bytes(&image.file_name).await {
            Err(AppError::NotFound(_)) => {
                warn!(file_name = %image.file_name, "image row has no backing file");
                return Err(RenderError::Unreadable.into());
            }
            other => other?,
        };

        let renderer = Arc::clone(&self.renderer);
        let encoded = tokio::task::spawn_blocking(move || renderer.render_box(&bytes, &bbox))
            .await
            .map_err(AppError::internal)??;
        debug!(encoded_len = encoded.len(), "overlay rendered");

        let verdict = self.verifier.verify(&encoded).await?;
        info!(valid = verdict.valid, "verdict received");
        Ok(verdict)
    }
}
