//! Record service
//!
//! Business logic for portfolio records:
//! - Schema validation of create and update inputs before any write
//! - Markdown rendering of content to HTML at write time
//! - Singleton access for the early-life story
//!
//! Validation runs the same `RecordSchema` the form engine uses, so clients
//! that skip client-side checks get back identical field messages.

use std::sync::Arc;

use crate::db::repositories::RecordRepository;
use crate::form::schema::{FieldErrors, ImageFileMeta, RecordDraft, RecordSchema};
use crate::models::{
    ContentRecord, CreateRecordInput, RecordImage, RecordKind, UpdateRecordInput,
};
use crate::services::markdown::MarkdownRenderer;

/// Error types for record service operations
#[derive(Debug, thiserror::Error)]
pub enum RecordServiceError {
    /// The record does not exist
    #[error("Record not found")]
    NotFound,

    /// The input violated the record schema
    #[error("Validation failed")]
    Validation(FieldErrors),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Record service coordinating validation, rendering and persistence
pub struct RecordService {
    repo: Arc<dyn RecordRepository>,
    renderer: MarkdownRenderer,
}

impl RecordService {
    /// Create a new record service
    pub fn new(repo: Arc<dyn RecordRepository>) -> Self {
        Self {
            repo,
            renderer: MarkdownRenderer::new(),
        }
    }

    /// Get a record by kind and ID
    pub async fn get(
        &self,
        kind: RecordKind,
        id: i64,
    ) -> Result<Option<ContentRecord>, RecordServiceError> {
        Ok(self.repo.get(kind, id).await?)
    }

    /// Get the first record of a kind, for singleton resources
    pub async fn first(
        &self,
        kind: RecordKind,
    ) -> Result<Option<ContentRecord>, RecordServiceError> {
        Ok(self.repo.first(kind).await?)
    }

    /// List all records of a kind, oldest first
    pub async fn list(&self, kind: RecordKind) -> Result<Vec<ContentRecord>, RecordServiceError> {
        Ok(self.repo.list(kind).await?)
    }

    /// Validate and create a record
    pub async fn create(
        &self,
        kind: RecordKind,
        mut input: CreateRecordInput,
    ) -> Result<ContentRecord, RecordServiceError> {
        let schema = RecordSchema::for_kind(kind);
        let draft = RecordDraft {
            title: &input.title,
            content: &input.content,
            date: input.date.as_deref().unwrap_or(""),
            image_source: input.image_source,
            image_url: input.image_url.as_deref().unwrap_or(""),
            image_file: input.image.as_ref().map(|image| ImageFileMeta {
                content_type: &image.content_type,
                len: image.data.len(),
            }),
            has_stored_image: false,
        };

        let errors = schema.validate(&draft);
        if !errors.is_empty() {
            return Err(RecordServiceError::Validation(errors));
        }

        input.content_html = Some(self.renderer.render(&input.content));
        let record = self.repo.create(kind, &input).await?;
        tracing::info!(kind = %kind.resource(), id = record.id, "Created record");
        Ok(record)
    }

    /// Validate and update a record.
    ///
    /// Unset input fields keep their stored values; validation runs against
    /// the merged draft so a partial update cannot leave the record invalid.
    pub async fn update(
        &self,
        kind: RecordKind,
        id: i64,
        mut input: UpdateRecordInput,
    ) -> Result<ContentRecord, RecordServiceError> {
        let Some(existing) = self.repo.get(kind, id).await? else {
            return Err(RecordServiceError::NotFound);
        };

        let schema = RecordSchema::for_kind(kind);
        let image_source = input.image_source.unwrap_or(existing.image_source);
        let merged_url = match input.image_url.as_deref() {
            Some(url) => url,
            None => existing.image_url.as_deref().unwrap_or(""),
        };
        let draft = RecordDraft {
            title: input.title.as_deref().unwrap_or(&existing.title),
            content: input.content.as_deref().unwrap_or(&existing.content),
            date: match input.date.as_deref() {
                Some(date) => date,
                None => existing.date.as_deref().unwrap_or(""),
            },
            image_source,
            image_url: merged_url,
            image_file: input.image.as_ref().map(|image| ImageFileMeta {
                content_type: &image.content_type,
                len: image.data.len(),
            }),
            has_stored_image: existing.has_stored_image(),
        };

        let errors = schema.validate(&draft);
        if !errors.is_empty() {
            return Err(RecordServiceError::Validation(errors));
        }

        if let Some(content) = &input.content {
            input.content_html = Some(self.renderer.render(content));
        }

        let updated = self
            .repo
            .update(kind, id, &input)
            .await?
            .ok_or(RecordServiceError::NotFound)?;
        tracing::info!(kind = %kind.resource(), id, "Updated record");
        Ok(updated)
    }

    /// Delete a record
    pub async fn delete(&self, kind: RecordKind, id: i64) -> Result<(), RecordServiceError> {
        if !self.repo.delete(kind, id).await? {
            return Err(RecordServiceError::NotFound);
        }
        tracing::info!(kind = %kind.resource(), id, "Deleted record");
        Ok(())
    }

    /// Fetch the stored binary image of a record
    pub async fn get_image(
        &self,
        kind: RecordKind,
        id: i64,
    ) -> Result<Option<RecordImage>, RecordServiceError> {
        Ok(self.repo.get_image(kind, id).await?)
    }
}
