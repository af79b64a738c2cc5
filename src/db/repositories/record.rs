//! Record repository
//!
//! Database operations for portfolio records.
//!
//! This module provides:
//! - `RecordRepository` trait defining the interface for record data access
//! - `SqlxRecordRepository` implementing the trait on SQLite
//!
//! The binary image payload lives in the same row (`image_data`) but is never
//! loaded by the record queries; it is fetched separately by `get_image` so
//! list and detail responses stay small.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::sync::Arc;

use crate::models::{
    ContentRecord, CreateRecordInput, ImageSource, RecordImage, RecordKind, UpdateRecordInput,
};

/// Record repository trait
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Create a new record of the given kind
    async fn create(&self, kind: RecordKind, input: &CreateRecordInput) -> Result<ContentRecord>;

    /// Get a record by kind and ID
    async fn get(&self, kind: RecordKind, id: i64) -> Result<Option<ContentRecord>>;

    /// Get the first record of a kind (for singleton resources)
    async fn first(&self, kind: RecordKind) -> Result<Option<ContentRecord>>;

    /// List all records of a kind, oldest first
    async fn list(&self, kind: RecordKind) -> Result<Vec<ContentRecord>>;

    /// Count records of a kind
    async fn count(&self, kind: RecordKind) -> Result<i64>;

    /// Update a record. Returns `None` if the record does not exist.
    ///
    /// When the input carries a new image source, the inactive image branch
    /// is cleared in the same statement so a row never holds both a URL and
    /// a binary payload.
    async fn update(
        &self,
        kind: RecordKind,
        id: i64,
        input: &UpdateRecordInput,
    ) -> Result<Option<ContentRecord>>;

    /// Delete a record. Returns whether a row was removed.
    async fn delete(&self, kind: RecordKind, id: i64) -> Result<bool>;

    /// Fetch the stored binary image of a record, if any
    async fn get_image(&self, kind: RecordKind, id: i64) -> Result<Option<RecordImage>>;
}

/// SQLx-based record repository implementation
pub struct SqlxRecordRepository {
    pool: SqlitePool,
}

impl SqlxRecordRepository {
    /// Create a new SQLx record repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn RecordRepository> {
        Arc::new(Self::new(pool))
    }
}

const RECORD_COLUMNS: &str = "id, kind, title, content, content_html, date, \
     image_source, image_url, image_type, created_at, updated_at";

fn map_record(row: &SqliteRow) -> Result<ContentRecord> {
    let kind: String = row.get("kind");
    let image_source: String = row.get("image_source");
    Ok(ContentRecord {
        id: row.get("id"),
        kind: RecordKind::from_resource(&kind)
            .with_context(|| format!("Unknown record kind in database: {}", kind))?,
        title: row.get("title"),
        content: row.get("content"),
        content_html: row.get("content_html"),
        date: row.get("date"),
        image_source: ImageSource::from_str(&image_source)
            .with_context(|| format!("Unknown image source in database: {}", image_source))?,
        image_url: row.get("image_url"),
        image_type: row.get("image_type"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl RecordRepository for SqlxRecordRepository {
    async fn create(&self, kind: RecordKind, input: &CreateRecordInput) -> Result<ContentRecord> {
        let now = Utc::now();
        let (image_type, image_data) = match (&input.image, input.image_source) {
            (Some(image), ImageSource::Upload) => {
                (Some(image.content_type.clone()), Some(image.data.clone()))
            }
            _ => (None, None),
        };
        let image_url = match input.image_source {
            ImageSource::Url => input.image_url.clone(),
            ImageSource::Upload => None,
        };

        let result = sqlx::query(
            r#"
            INSERT INTO records
                (kind, title, content, content_html, date,
                 image_source, image_url, image_type, image_data,
                 created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(kind.resource())
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.content_html.as_deref().unwrap_or(""))
        .bind(&input.date)
        .bind(input.image_source.as_str())
        .bind(&image_url)
        .bind(&image_type)
        .bind(&image_data)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to insert record")?;

        let id = result.last_insert_rowid();
        self.get(kind, id)
            .await?
            .context("Inserted record not found")
    }

    async fn get(&self, kind: RecordKind, id: i64) -> Result<Option<ContentRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM records WHERE kind = ? AND id = ?",
            RECORD_COLUMNS
        ))
        .bind(kind.resource())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch record")?;

        row.as_ref().map(map_record).transpose()
    }

    async fn first(&self, kind: RecordKind) -> Result<Option<ContentRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM records WHERE kind = ? ORDER BY id LIMIT 1",
            RECORD_COLUMNS
        ))
        .bind(kind.resource())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch record")?;

        row.as_ref().map(map_record).transpose()
    }

    async fn list(&self, kind: RecordKind) -> Result<Vec<ContentRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM records WHERE kind = ? ORDER BY id",
            RECORD_COLUMNS
        ))
        .bind(kind.resource())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list records")?;

        rows.iter().map(map_record).collect()
    }

    async fn count(&self, kind: RecordKind) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM records WHERE kind = ?")
            .bind(kind.resource())
            .fetch_one(&self.pool)
            .await
            .context("Failed to count records")?;
        Ok(row.0)
    }

    async fn update(
        &self,
        kind: RecordKind,
        id: i64,
        input: &UpdateRecordInput,
    ) -> Result<Option<ContentRecord>> {
        let Some(existing) = self.get(kind, id).await? else {
            return Ok(None);
        };

        let title = input.title.as_ref().unwrap_or(&existing.title);
        let content = input.content.as_ref().unwrap_or(&existing.content);
        let content_html = input
            .content_html
            .as_ref()
            .unwrap_or(&existing.content_html);
        let date = input.date.clone().or_else(|| existing.date.clone());
        let image_source = input.image_source.unwrap_or(existing.image_source);

        // Resolve the image branch. A new source wins; the inactive branch is
        // cleared so the row never holds both representations.
        let (image_url, image_type, image_data): (Option<String>, Option<String>, Option<Vec<u8>>) =
            match image_source {
                ImageSource::Url => {
                    let url = input
                        .image_url
                        .clone()
                        .or_else(|| existing.image_url.clone());
                    (url, None, None)
                }
                ImageSource::Upload => match &input.image {
                    Some(image) => (
                        None,
                        Some(image.content_type.clone()),
                        Some(image.data.clone()),
                    ),
                    // No new payload: keep the stored one
                    None => {
                        let stored = self.get_image(kind, id).await?;
                        (
                            None,
                            stored.as_ref().map(|i| i.content_type.clone()),
                            stored.map(|i| i.data),
                        )
                    }
                },
            };

        sqlx::query(
            r#"
            UPDATE records
            SET title = ?, content = ?, content_html = ?, date = ?,
                image_source = ?, image_url = ?, image_type = ?, image_data = ?,
                updated_at = ?
            WHERE kind = ? AND id = ?
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(content_html)
        .bind(&date)
        .bind(image_source.as_str())
        .bind(&image_url)
        .bind(&image_type)
        .bind(&image_data)
        .bind(Utc::now())
        .bind(kind.resource())
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update record")?;

        self.get(kind, id).await
    }

    async fn delete(&self, kind: RecordKind, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM records WHERE kind = ? AND id = ?")
            .bind(kind.resource())
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete record")?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_image(&self, kind: RecordKind, id: i64) -> Result<Option<RecordImage>> {
        let row = sqlx::query(
            "SELECT image_type, image_data FROM records WHERE kind = ? AND id = ?",
        )
        .bind(kind.resource())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch record image")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let content_type: Option<String> = row.get("image_type");
        let data: Option<Vec<u8>> = row.get("image_data");

        Ok(match (content_type, data) {
            (Some(content_type), Some(data)) => Some(RecordImage { data, content_type }),
            _ => None,
        })
    }
}
