//! # Rusty-Turk Binary
//!
//! The entry point that assembles the labeling API from its plugins.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use rt_api::AppState;
use rt_config::Settings;
use rt_core::AnnotationService;
use rt_db_sqlite::SqliteRepo;
use rt_render_image::JpegBoxRenderer;
use rt_storage_local::LocalImageStore;
use rt_vision_gemini::GeminiVerifier;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut settings = Settings::load().context("failed to load configuration")?;
    settings.log.init_tracing();

    // 1. Database (runs migrations)
    let repo = Arc::new(
        SqliteRepo::new(&settings.database.url, settings.database.max_connections)
            .await
            .context("failed to open database")?,
    );

    // 2. Image directory
    let store = LocalImageStore::new(settings.images.dir.clone());
    if !store.root().is_dir() {
        warn!(dir = %store.root().display(), "image directory does not exist yet");
    }

    // 3. Vision verifier
    if settings.vision.api_key.is_none() {
        warn!("vision.api_key is not set; /api/validate will fail until it is configured");
    }
    let verifier = GeminiVerifier::new(
        settings.vision.base_url.clone(),
        settings.vision.model.clone(),
        settings.vision.api_key.take(),
        Duration::from_secs(settings.vision.timeout_secs),
    )
    .context("failed to build vision client")?;

    // 4. Wire the service (dynamic dispatch keeps plugins swappable)
    let service = AnnotationService::new(
        repo.clone(),
        repo,
        Arc::new(store),
        Arc::new(JpegBoxRenderer::new()),
        Arc::new(verifier),
    );
    let state = AppState::new(service, settings.server.public_base_url());
    let app = rt_api::router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("invalid server.host/server.port")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, "rusty-turk listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
