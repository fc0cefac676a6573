//! # rt-storage-local
//! rusty-turk/crates/rt-plugins/rt-storage-local/src/lib.rs
//! Local filesystem implementation of `ImageStore`.
//! The directory is read-only from the service's point of view; files are
//! dropped in out of band and registered by `rt-ingest`.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use rt_core::error::{AppError, Result};
use rt_core::traits::ImageStore;
use tokio::fs;
use tracing::warn;

pub struct LocalImageStore {
    /// Root directory holding the image files (e.g., "./image")
    root_path: PathBuf,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root_path: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    /// Joins `file_name` onto the root, refusing anything that could step
    /// outside it (parent components, absolute paths, drive prefixes).
    fn resolve(&self, file_name: &str) -> Option<PathBuf> {
        let rel = Path::new(file_name);
        let safe = !file_name.is_empty()
            && rel.components().all(|c| matches!(c, Component::Normal(_)));
        safe.then(|| self.root_path.join(rel))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn read_bytes(&self, file_name: &str) -> Result<Vec<u8>> {
        let not_found = || {
            AppError::not_found(format!(
                "File {file_name} not found in {}",
                self.root_path.display()
            ))
        };

        let Some(path) = self.resolve(file_name) else {
            warn!(file_name, "rejected image path outside the image directory");
            return Err(not_found());
        };

        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            // Reading a directory fails with a platform-specific kind; treat it as absent too.
            Err(e) if e.kind() == ErrorKind::NotFound || path.is_dir() => Err(not_found()),
            Err(e) => Err(AppError::Internal(format!("IO error: {e}"))),
        }
    }

    async fn list_files(&self) -> Result<Vec<String>> {
        let mut entries = match fs::read_dir(&self.root_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AppError::not_found("Image folder not found"))
            }
            Err(e) => return Err(AppError::Internal(format!("IO error: {e}"))),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppError::Internal(format!("IO error: {e}")))?
        {
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => files.push(name),
                Err(raw) => warn!(?raw, "skipping non UTF-8 file name"),
            }
        }
        files.sort();
        Ok(files)
    }
}
