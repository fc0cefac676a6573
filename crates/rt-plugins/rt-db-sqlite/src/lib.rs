//! # rt-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `rt-core` domain models.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rt_core::error::{AppError, Result};
use rt_core::models::{Annotation, BoundingBox, Image, NewAnnotation};
use rt_core::traits::{AnnotationRepo, ImageRepo};
use sqlx::error::ErrorKind;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info};

pub struct SqliteRepo {
    pool: SqlitePool,
}

// Helper for mapping driver errors onto the domain taxonomy
fn db_err(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db) = err {
        if db.kind() == ErrorKind::ForeignKeyViolation {
            return AppError::bad_request("Unknown image_id");
        }
    }
    AppError::Internal(format!("database error: {err}"))
}

fn row_to_image(row: &SqliteRow) -> Result<Image> {
    Ok(Image {
        id: row.try_get("id").map_err(db_err)?,
        file_name: row.try_get("file_name").map_err(db_err)?,
    })
}

fn row_to_annotation(row: &SqliteRow) -> Result<Annotation> {
    let boxes: Vec<BoundingBox> =
        serde_json::from_str(&row.try_get::<String, _>("bounding_boxes").map_err(db_err)?)?;
    Ok(Annotation {
        id: row.try_get("id").map_err(db_err)?,
        worker_id: row.try_get("worker_id").map_err(db_err)?,
        image_id: row.try_get("image_id").map_err(db_err)?,
        boxes,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(db_err)?,
    })
}

impl SqliteRepo {
    /// Opens (creating if needed) the database and applies pending migrations.
    ///
    /// # Developer Note
    /// An in-memory database lives as long as its connection, so the pool is
    /// pinned to one connection that is never recycled.
    pub async fn new(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(db_err)?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = url.contains(":memory:");
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { max_connections.max(1) })
            .idle_timeout(if in_memory { None } else { Some(std::time::Duration::from_secs(600)) })
            .max_lifetime(if in_memory { None } else { Some(std::time::Duration::from_secs(1800)) })
            .connect_with(options)
            .await
            .map_err(db_err)?;

        let repo = Self { pool };
        repo.migrate().await?;
        info!(url, "sqlite store ready");
        Ok(repo)
    }

    /// Idempotent schema setup; safe to run on every start.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("migration failed: {e}")))
    }
}

#[async_trait]
impl ImageRepo for SqliteRepo {
    async fn random_image(&self) -> Result<Image> {
        let row = sqlx::query("SELECT id, file_name FROM images ORDER BY RANDOM() LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        match row {
            Some(row) => row_to_image(&row),
            None => Err(AppError::not_found("No images found in database")),
        }
    }

    async fn get_image(&self, id: i64) -> Result<Image> {
        let row = sqlx::query("SELECT id, file_name FROM images WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        match row {
            Some(row) => row_to_image(&row),
            None => Err(AppError::not_found("Image not found")),
        }
    }

    async fn insert_image_if_absent(&self, file_name: &str) -> Result<bool> {
        let result = sqlx::query("INSERT OR IGNORE INTO images (file_name) VALUES (?)")
            .bind(file_name)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl AnnotationRepo for SqliteRepo {
    /// Inserts the batch inside one transaction.
    ///
    /// # Developer Note
    /// Dropping `tx` on an early return rolls back every row inserted so far,
    /// so a foreign-key failure on the last element leaves nothing behind.
    async fn insert_many(&self, worker_id: &str, batch: &[NewAnnotation]) -> Result<Vec<i64>> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let created_at = Utc::now();
        let mut ids = Vec::with_capacity(batch.len());

        for item in batch {
            let result = sqlx::query(
                "INSERT INTO annotations (worker_id, image_id, bounding_boxes, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(worker_id)
            .bind(item.image_id)
            .bind(serde_json::to_string(&item.boxes)?)
            .bind(created_at)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
            ids.push(result.last_insert_rowid());
        }

        tx.commit().await.map_err(db_err)?;
        debug!(worker_id, count = ids.len(), "annotation batch committed");
        Ok(ids)
    }

    async fn list_all(&self) -> Result<Vec<Annotation>> {
        sqlx::query(
            "SELECT id, worker_id, image_id, bounding_boxes, created_at FROM annotations ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?
        .iter()
        .map(row_to_annotation)
        .collect()
    }
}
