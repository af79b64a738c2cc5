//! API client for the editing pipeline
//!
//! Thin typed wrapper over reqwest: fetches records, serializes drafts to
//! multipart form data, and maps the server's response statuses onto the
//! editor's error taxonomy. Every request carries an explicit timeout so a
//! hung connection surfaces as a distinct "timed out" failure instead of a
//! submit button that never re-enables.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::form::schema::{Field, FieldErrors};
use crate::form::state::ImageFile;
use crate::models::{ContentRecord, ImageSource};

/// Default per-request timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Failures the pipeline distinguishes between
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request did not complete within the timeout
    #[error("the request timed out")]
    TimedOut,

    /// The target record does not exist (404)
    #[error("record not found")]
    NotFound,

    /// The server rejected the payload with field errors (400)
    #[error("validation rejected by server")]
    Rejected(FieldErrors),

    /// Any other non-success status
    #[error("server returned status {0}")]
    Status(u16),

    /// The request could not be made or the body could not be read
    #[error("network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::TimedOut
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

/// HTTP method for a submit call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMethod {
    /// Create a new record
    Post,
    /// Edit an existing record
    Patch,
}

/// Everything that goes into one multipart submission.
///
/// Exactly one image branch may be populated; the pipeline builds the
/// payload from form state after validation, nulling out whichever branch
/// is inactive.
#[derive(Debug, Clone)]
pub struct SubmitPayload {
    pub title: String,
    pub content: String,
    pub date: String,
    pub image_source: ImageSource,
    pub image_url: Option<String>,
    pub image_file: Option<ImageFile>,
}

impl SubmitPayload {
    fn into_multipart(self) -> Result<reqwest::multipart::Form, ClientError> {
        let mut form = reqwest::multipart::Form::new()
            .text("title", self.title)
            .text("content", self.content)
            .text("date", self.date)
            .text("imageSource", self.image_source.as_str());

        if let Some(url) = self.image_url {
            form = form.text("imageUrl", url);
        }
        if let Some(file) = self.image_file {
            let part = reqwest::multipart::Part::bytes(file.bytes)
                .file_name(file.name)
                .mime_str(&file.content_type)
                .map_err(|e| ClientError::Network(e.to_string()))?;
            form = form.part("imageFile", part);
        }

        Ok(form)
    }
}

#[derive(Debug, Deserialize)]
struct ValidationBody {
    #[serde(default)]
    errors: BTreeMap<String, String>,
}

/// Typed HTTP client for the record endpoints
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client with the default timeout
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, REQUEST_TIMEOUT)
    }

    /// Create a client with an explicit timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Attach a session token sent as a bearer credential on every request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch one record from `path` (e.g. `/api/v1/early-life` or
    /// `/api/v1/player-career/3`)
    pub async fn fetch_record(&self, path: &str) -> Result<ContentRecord, ClientError> {
        let response = self
            .request(reqwest::Method::GET, path)
            .send()
            .await
            .map_err(ClientError::from)?;
        Self::parse_record(response).await
    }

    /// Submit a draft as multipart form data
    pub async fn submit(
        &self,
        method: SubmitMethod,
        path: &str,
        payload: SubmitPayload,
    ) -> Result<ContentRecord, ClientError> {
        let method = match method {
            SubmitMethod::Post => reqwest::Method::POST,
            SubmitMethod::Patch => reqwest::Method::PATCH,
        };
        let response = self
            .request(method, path)
            .multipart(payload.into_multipart()?)
            .send()
            .await
            .map_err(ClientError::from)?;
        Self::parse_record(response).await
    }

    /// Delete the record at `path`
    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        let response = self
            .request(reqwest::Method::DELETE, path)
            .send()
            .await
            .map_err(ClientError::from)?;

        match response.status().as_u16() {
            200 | 204 => Ok(()),
            404 => Err(ClientError::NotFound),
            status => Err(ClientError::Status(status)),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some(ref token) = self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn parse_record(response: reqwest::Response) -> Result<ContentRecord, ClientError> {
        match response.status().as_u16() {
            200 | 201 => response
                .json::<ContentRecord>()
                .await
                .map_err(|e| ClientError::Network(e.to_string())),
            400 => {
                let body = response
                    .json::<ValidationBody>()
                    .await
                    .unwrap_or(ValidationBody {
                        errors: BTreeMap::new(),
                    });
                Err(ClientError::Rejected(map_field_errors(body.errors)))
            }
            404 => Err(ClientError::NotFound),
            status => Err(ClientError::Status(status)),
        }
    }
}

/// Map the server's string-keyed errors onto the editor's fields.
///
/// Unknown keys are dropped rather than failing the whole response, so a
/// newer server cannot break an older editor.
fn map_field_errors(errors: BTreeMap<String, String>) -> FieldErrors {
    errors
        .into_iter()
        .filter_map(|(key, message)| Field::from_str(&key).map(|field| (field, message)))
        .collect()
}
