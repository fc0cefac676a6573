//! # AppError
//!
//! Centralized error handling for the Rusty-Turk ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// Failures raised by the box renderer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("image not found or unreadable")]
    Unreadable,

    #[error("invalid bounding box")]
    InvalidBox,

    #[error("failed to encode overlay: {0}")]
    Encode(String),
}

impl RenderError {
    /// Structural errors are the caller's fault (bad image, bad box) and
    /// surface as 400; everything else is a server-side failure.
    pub fn is_structural(&self) -> bool {
        matches!(self, RenderError::Unreadable | RenderError::InvalidBox)
    }
}

/// The primary error type for all rt-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or missing input fields
    #[error("{0}")]
    BadRequest(String),

    /// Referenced image, file or directory is absent
    #[error("{0}")]
    NotFound(String),

    /// Image decode or box-shape failure in the renderer
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The external vision call failed
    #[error("vision service error: {0}")]
    ExternalService(String),

    /// Infrastructure failure (e.g., DB down, disk error)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("serialization error: {err}"))
    }
}

/// A specialized Result type for Rusty-Turk logic.
pub type Result<T> = std::result::Result<T, AppError>;
