//! Shared fixtures for the end-to-end tests: a temp image directory, an
//! in-memory SQLite store and a scripted vision verifier.

use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use image::{ImageFormat, Rgb, RgbImage};
use rt_api::AppState;
use rt_core::error::{AppError, Result};
use rt_core::models::Verdict;
use rt_core::traits::VisionVerifier;
use rt_core::AnnotationService;
use rt_db_sqlite::SqliteRepo;
use rt_render_image::JpegBoxRenderer;
use rt_storage_local::LocalImageStore;
use tempfile::TempDir;

/// Writes a solid-grey PNG of the given size.
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) {
    let mut out = Cursor::new(Vec::new());
    RgbImage::from_pixel(width, height, Rgb([90, 90, 90]))
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode fixture png");
    std::fs::write(dir.join(name), out.into_inner()).expect("write fixture png");
}

/// Replies with a fixed text after checking the payload is a decodable JPEG.
pub struct ScriptedVerifier {
    reply: String,
    calls: AtomicUsize,
}

impl ScriptedVerifier {
    pub fn new(reply: &str) -> Self {
        Self { reply: reply.to_string(), calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisionVerifier for ScriptedVerifier {
    async fn verify(&self, jpeg_base64: &str) -> Result<Verdict> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(jpeg_base64)
            .map_err(AppError::internal)?;
        if image::guess_format(&bytes).ok() != Some(ImageFormat::Jpeg) {
            return Err(AppError::internal("verifier received a non-JPEG payload"));
        }
        Ok(Verdict::from_reply(self.reply.clone()))
    }
}

pub struct TestEnv {
    pub dir: TempDir,
    pub repo: Arc<SqliteRepo>,
    pub store: Arc<LocalImageStore>,
    pub verifier: Arc<ScriptedVerifier>,
}

impl TestEnv {
    pub async fn new(reply: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = Arc::new(SqliteRepo::new("sqlite::memory:", 1).await.expect("sqlite"));
        let store = Arc::new(LocalImageStore::new(dir.path()));
        Self {
            dir,
            repo,
            store,
            verifier: Arc::new(ScriptedVerifier::new(reply)),
        }
    }

    pub fn router(&self) -> axum::Router {
        let service = AnnotationService::new(
            self.repo.clone(),
            self.repo.clone(),
            self.store.clone(),
            Arc::new(JpegBoxRenderer::new()),
            self.verifier.clone(),
        );
        rt_api::router(AppState::new(service, "http://localhost:8080"))
    }
}
