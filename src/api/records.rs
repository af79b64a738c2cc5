//! Record API endpoints
//!
//! One set of handlers serves every record kind; the kind is resolved from
//! the `{resource}` path segment. Endpoints:
//! - GET /api/v1/{resource} - list entries (singleton kinds return the record)
//! - GET /api/v1/{resource}/{id} - get one entry
//! - GET /api/v1/{resource}/{id}/image - stored image bytes
//! - POST /api/v1/{resource} - create from a multipart form (admin)
//! - PATCH /api/v1/{resource}/{id} - update from a multipart form (admin)
//! - DELETE /api/v1/{resource}/{id} - delete, responds 204 (admin)
//!
//! Create and update accept the same multipart fields the form engine sends:
//! `title`, `content`, `date`, `imageSource`, and either `imageUrl` or
//! `imageFile`.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::api::middleware::{ApiError, AppState};
use crate::models::{
    ContentRecord, CreateRecordInput, ImageSource, RecordImage, RecordKind, UpdateRecordInput,
};

/// Resolve the `{resource}` path segment to a record kind
fn resolve_kind(resource: &str) -> Result<RecordKind, ApiError> {
    RecordKind::from_resource(resource)
        .ok_or_else(|| ApiError::not_found(format!("Unknown resource: {}", resource)))
}

/// Fields parsed from a record multipart form
#[derive(Debug, Default)]
struct RecordForm {
    title: Option<String>,
    content: Option<String>,
    date: Option<String>,
    image_source: Option<ImageSource>,
    image_url: Option<String>,
    image: Option<RecordImage>,
}

/// Read the multipart body into a `RecordForm`. Unknown parts are skipped.
async fn parse_record_form(mut multipart: Multipart) -> Result<RecordForm, ApiError> {
    let mut form = RecordForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {}", e)))?
    {
        let Some(name) = field.name().map(String::from) else {
            continue;
        };

        match name.as_str() {
            "title" => form.title = Some(read_text(field).await?),
            "content" => form.content = Some(read_text(field).await?),
            "date" => form.date = Some(read_text(field).await?),
            "imageSource" => {
                let value = read_text(field).await?;
                form.image_source = Some(ImageSource::from_str(&value).ok_or_else(|| {
                    ApiError::bad_request(format!("Unknown image source: {}", value))
                })?);
            }
            "imageUrl" => form.image_url = Some(read_text(field).await?),
            "imageFile" => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {}", e)))?;
                form.image = Some(RecordImage {
                    data: data.to_vec(),
                    content_type,
                });
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read field: {}", e)))
}

/// GET /api/v1/{resource}
///
/// List kinds return a JSON array, oldest first. Singleton kinds return the
/// one record directly, or 404 when it has not been created yet.
pub async fn get_collection(
    State(state): State<AppState>,
    Path(resource): Path<String>,
) -> Result<Response, ApiError> {
    let kind = resolve_kind(&resource)?;

    if kind.is_singleton() {
        let record = state
            .record_service
            .first(kind)
            .await?
            .ok_or_else(|| ApiError::not_found("Record not found"))?;
        return Ok(Json(record).into_response());
    }

    let records = state.record_service.list(kind).await?;
    Ok(Json(records).into_response())
}

/// GET /api/v1/{resource}/{id}
pub async fn get_record(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, i64)>,
) -> Result<Json<ContentRecord>, ApiError> {
    let kind = resolve_kind(&resource)?;
    let record = state
        .record_service
        .get(kind, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Record not found"))?;
    Ok(Json(record))
}

/// GET /api/v1/{resource}/{id}/image
///
/// Serves the stored binary image with its original content type. Records
/// whose image is a remote URL have no stored bytes and respond 404.
pub async fn get_record_image(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, i64)>,
) -> Result<Response, ApiError> {
    let kind = resolve_kind(&resource)?;
    let image = state
        .record_service
        .get_image(kind, id)
        .await?
        .ok_or_else(|| ApiError::not_found("No stored image"))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, image.content_type)],
        image.data,
    )
        .into_response())
}

/// POST /api/v1/{resource} - create a record, responds 201
pub async fn create_record(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ContentRecord>), ApiError> {
    let kind = resolve_kind(&resource)?;
    let form = parse_record_form(multipart).await?;

    let input = CreateRecordInput {
        title: form.title.unwrap_or_default(),
        content: form.content.unwrap_or_default(),
        content_html: None,
        date: form.date.filter(|d| !d.trim().is_empty()),
        image_source: form.image_source.unwrap_or_default(),
        image_url: form.image_url.filter(|u| !u.trim().is_empty()),
        image: form.image,
    };

    let record = state.record_service.create(kind, input).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PATCH /api/v1/{resource}/{id} - update a record
pub async fn update_record(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, i64)>,
    multipart: Multipart,
) -> Result<Json<ContentRecord>, ApiError> {
    let kind = resolve_kind(&resource)?;
    let form = parse_record_form(multipart).await?;

    let input = UpdateRecordInput {
        title: form.title,
        content: form.content,
        content_html: None,
        date: form.date.filter(|d| !d.trim().is_empty()),
        image_source: form.image_source,
        image_url: form.image_url,
        image: form.image,
    };

    let record = state.record_service.update(kind, id, input).await?;
    Ok(Json(record))
}

/// DELETE /api/v1/{resource}/{id} - delete a record, responds 204
pub async fn delete_record(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, i64)>,
) -> Result<StatusCode, ApiError> {
    let kind = resolve_kind(&resource)?;
    state.record_service.delete(kind, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
