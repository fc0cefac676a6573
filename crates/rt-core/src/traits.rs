//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;

use crate::error::{RenderError, Result};
use crate::models::{Annotation, Image, NewAnnotation, Verdict};

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

/// Persistence contract for image records.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait ImageRepo: Send + Sync {
    /// Uniformly random pick; `NotFound` when no images are registered.
    async fn random_image(&self) -> Result<Image>;
    /// `NotFound` when the id is unknown.
    async fn get_image(&self, id: i64) -> Result<Image>;
    /// Returns `true` when a new row was created, `false` if the name was already known.
    async fn insert_image_if_absent(&self, file_name: &str) -> Result<bool>;
}

/// Persistence contract for annotations.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait AnnotationRepo: Send + Sync {
    /// Appends the whole batch atomically and returns the new ids in input order.
    async fn insert_many(&self, worker_id: &str, batch: &[NewAnnotation]) -> Result<Vec<i64>>;
    async fn list_all(&self) -> Result<Vec<Annotation>>;
}

/// Byte access to the image directory.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// `NotFound` when the file is absent, regardless of what the database says.
    async fn read_bytes(&self, file_name: &str) -> Result<Vec<u8>>;
    /// Names of the files in the directory; `NotFound` when the directory is missing.
    async fn list_files(&self) -> Result<Vec<String>>;
}

/// Draws a box overlay and serializes the result.
///
/// Implementations are CPU-bound and are called from a blocking thread.
#[cfg_attr(any(test, feature = "testing"), automock)]
pub trait OverlayRenderer: Send + Sync {
    /// Returns the annotated image as base64-encoded JPEG.
    fn render_box(&self, image: &[u8], bbox: &[f64]) -> std::result::Result<String, RenderError>;
}

/// External judge for a rendered overlay.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait VisionVerifier: Send + Sync {
    async fn verify(&self, jpeg_base64: &str) -> Result<Verdict>;
}
