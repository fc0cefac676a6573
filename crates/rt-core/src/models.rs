//! # Domain Models
//!
//! These structs represent the core entities of Rusty-Turk plus the typed
//! request/response bodies the HTTP layer exchanges with annotators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wire format for annotation timestamps. Second precision, always UTC.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// An image registered by ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: i64,
    /// Name of the file inside the image directory; unique per store.
    pub file_name: String,
}

/// Axis-aligned rectangle in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One worker's set of boxes for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: i64,
    pub worker_id: String,
    pub image_id: i64,
    pub boxes: Vec<BoundingBox>,
    /// Server-assigned at insert time
    pub created_at: DateTime<Utc>,
}

/// An element of a submission batch that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnnotation {
    pub image_id: i64,
    pub boxes: Vec<BoundingBox>,
}

/// Structured judgment derived from the vision model's free-text reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub valid: bool,
    /// The model reply, verbatim
    pub reason: String,
}

impl Verdict {
    /// A reply counts as valid when the literal `Valid` appears anywhere in it.
    ///
    /// The match is case-sensitive and unanchored. "Invalid" does not contain
    /// "Valid", but a negative sentence that quotes the word still passes.
    pub fn from_reply(reply: impl Into<String>) -> Self {
        let reason = reply.into();
        Self {
            valid: reason.contains("Valid"),
            reason,
        }
    }
}

// ── Request bodies ──────────────────────────────────────────────────────────
//
// Every field is optional so that presence is checked by the service with the
// exact error message the clients expect, instead of a generic decode failure.

/// Body of `POST /api/submit`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitRequest {
    pub worker_id: Option<String>,
    pub annotations: Option<Vec<AnnotationInput>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnotationInput {
    pub image_id: Option<i64>,
    /// Decoded into [`BoundingBox`] per element, so a bad box fails only its element.
    pub bounding_boxes: Option<Vec<serde_json::Value>>,
}

/// Body of `POST /api/validate`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidateRequest {
    pub image_id: Option<i64>,
    /// `[x, y, width, height]`; kept loose so non-numeric entries get a precise error.
    pub bounding_box: Option<Vec<serde_json::Value>>,
}

// ── Response bodies ─────────────────────────────────────────────────────────

/// Body of `GET /api/image`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomImage {
    pub image_id: i64,
    pub image_url: String,
}

/// Listing representation of an [`Annotation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationView {
    pub id: i64,
    pub worker_id: String,
    pub image_id: i64,
    pub bounding_boxes: Vec<BoundingBox>,
    pub timestamp: String,
}

impl From<Annotation> for AnnotationView {
    fn from(a: Annotation) -> Self {
        Self {
            id: a.id,
            worker_id: a.worker_id,
            image_id: a.image_id,
            bounding_boxes: a.boxes,
            timestamp: a.created_at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn verdict_accepts_leading_valid() {
        let v = Verdict::from_reply("Valid: box fits well");
        assert!(v.valid);
        assert_eq!(v.reason, "Valid: box fits well");
    }

    #[test]
    fn verdict_rejects_leading_invalid() {
        assert!(!Verdict::from_reply("Invalid: box too small").valid);
    }

    #[test]
    fn verdict_is_case_sensitive() {
        assert!(!Verdict::from_reply("valid, looks fine").valid);
    }

    /// Substring matching is fragile: a rejection that quotes the word still
    /// passes. Kept on purpose so accepted/rejected outcomes do not shift.
    #[test]
    fn verdict_substring_match_is_fragile() {
        let v = Verdict::from_reply("Invalid. This could never be called Valid.");
        assert!(v.valid);
    }

    #[test]
    fn view_truncates_timestamp_to_seconds() {
        let created_at = Utc
            .with_ymd_and_hms(2024, 3, 9, 7, 5, 1)
            .unwrap()
            .checked_add_signed(chrono::Duration::milliseconds(987))
            .unwrap();
        let view = AnnotationView::from(Annotation {
            id: 1,
            worker_id: "w-1".into(),
            image_id: 4,
            boxes: vec![BoundingBox { x: 1.0, y: 2.0, width: 3.0, height: 4.0 }],
            created_at,
        });
        assert_eq!(view.timestamp, "2024-03-09 07:05:01");
        assert_eq!(view.bounding_boxes.len(), 1);
    }

    #[test]
    fn submit_request_tolerates_missing_fields() {
        let req: SubmitRequest = serde_json::from_str(r#"{"worker_id":"w"}"#).unwrap();
        assert!(req.annotations.is_none());
        assert_eq!(req.worker_id.as_deref(), Some("w"));
    }
}
