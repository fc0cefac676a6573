//! # Ingestion
//!
//! Registers the image files found in the image directory. Safe to re-run:
//! names that already have a row are skipped.

use tracing::{debug, info};

use crate::error::Result;
use crate::traits::{ImageRepo, ImageStore};

/// Extensions picked up by ingestion. Matching is case-sensitive.
pub const IMAGE_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    /// Files with a supported extension
    pub scanned: usize,
    pub inserted: usize,
    pub skipped: usize,
}

pub fn is_ingestible(file_name: &str) -> bool {
    IMAGE_EXTENSIONS.iter().any(|ext| file_name.ends_with(ext))
}

pub async fn ingest_directory(store: &dyn ImageStore, repo: &dyn ImageRepo) -> Result<IngestReport> {
    let mut report = IngestReport::default();

    for name in store.list_files().await?.into_iter().filter(|n| is_ingestible(n)) {
        report.scanned += 1;
        if repo.insert_image_if_absent(&name).await? {
            debug!(file_name = %name, "registered image");
            report.inserted += 1;
        } else {
            report.skipped += 1;
        }
    }

    info!(
        scanned = report.scanned,
        inserted = report.inserted,
        skipped = report.skipped,
        "ingestion finished"
    );
    Ok(report)
}
