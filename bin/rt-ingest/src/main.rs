//! # rt-ingest
//!
//! Out-of-band ingestion: registers every `.jpg`/`.jpeg`/`.png` in the image
//! directory that the database does not know yet. Re-running is a no-op.

use anyhow::Context;
use rt_config::Settings;
use rt_core::ingest::ingest_directory;
use rt_db_sqlite::SqliteRepo;
use rt_storage_local::LocalImageStore;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load configuration")?;
    settings.log.init_tracing();

    let repo = SqliteRepo::new(&settings.database.url, settings.database.max_connections)
        .await
        .context("failed to open database")?;
    let store = LocalImageStore::new(settings.images.dir.clone());

    info!(dir = %store.root().display(), "scanning image directory");
    let report = ingest_directory(&store, &repo)
        .await
        .context("ingestion failed")?;

    println!(
        "{} new image(s) registered, {} already known",
        report.inserted, report.skipped
    );
    Ok(())
}
