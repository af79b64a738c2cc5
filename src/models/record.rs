//! Content record model
//!
//! This module provides:
//! - `ContentRecord` entity representing one editable portfolio record
//! - `RecordKind` enum selecting which section of the site a record belongs to
//! - `ImageSource` enum for the two mutually exclusive image strategies
//! - Input types for creating and updating records
//!
//! A record's image is either a remote URL (`ImageSource::Url`) or a binary
//! payload stored in the database (`ImageSource::Upload`). Never both: the
//! write path nulls out whichever branch is inactive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One editable portfolio record (early-life story or a career entry)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    /// Unique identifier
    pub id: i64,
    /// Which section of the site this record belongs to
    pub kind: RecordKind,
    /// Record title
    pub title: String,
    /// Markdown content
    pub content: String,
    /// Rendered HTML content
    #[serde(default)]
    pub content_html: String,
    /// Free-form date or date range (e.g. "1998–2004"), not set for all kinds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Which image strategy is active
    pub image_source: ImageSource,
    /// Remote image URL (only when `image_source` is `Url`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// MIME type of the stored binary image (only when `image_source` is `Upload`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_type: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl ContentRecord {
    /// True when the active image is an uploaded binary rather than a URL
    pub fn has_stored_image(&self) -> bool {
        self.image_source == ImageSource::Upload && self.image_type.is_some()
    }

    /// Path of the endpoint serving this record's stored image bytes
    pub fn image_endpoint(&self) -> String {
        format!("/api/v1/{}/{}/image", self.kind.resource(), self.id)
    }
}

/// Section of the site a record belongs to.
///
/// Each kind is persisted through its own resource path. `EarlyLife` is a
/// singleton resource (the site has one biography story); the career kinds
/// are lists of entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordKind {
    /// The coach's early-life biography (single record)
    EarlyLife,
    /// One entry of the playing career
    PlayerCareer,
    /// One entry of the coaching career
    CoachingCareer,
}

impl RecordKind {
    /// Resource path segment under `/api/v1/`
    pub fn resource(&self) -> &'static str {
        match self {
            RecordKind::EarlyLife => "early-life",
            RecordKind::PlayerCareer => "player-career",
            RecordKind::CoachingCareer => "coaching-career",
        }
    }

    /// Parse a resource path segment
    pub fn from_resource(s: &str) -> Option<Self> {
        match s {
            "early-life" => Some(RecordKind::EarlyLife),
            "player-career" => Some(RecordKind::PlayerCareer),
            "coaching-career" => Some(RecordKind::CoachingCareer),
            _ => None,
        }
    }

    /// Whether this kind holds at most one record
    pub fn is_singleton(&self) -> bool {
        matches!(self, RecordKind::EarlyLife)
    }

    /// All record kinds
    pub fn all() -> [RecordKind; 3] {
        [
            RecordKind::EarlyLife,
            RecordKind::PlayerCareer,
            RecordKind::CoachingCareer,
        ]
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.resource())
    }
}

/// Image acquisition strategy for a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageSource {
    /// Remote image referenced by URL
    #[default]
    #[serde(rename = "URL")]
    Url,
    /// Binary image uploaded and stored alongside the record
    #[serde(rename = "UPLOAD")]
    Upload,
}

impl ImageSource {
    /// Wire/database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSource::Url => "URL",
            ImageSource::Upload => "UPLOAD",
        }
    }

    /// Parse from the wire/database representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "URL" => Some(ImageSource::Url),
            "UPLOAD" => Some(ImageSource::Upload),
            _ => None,
        }
    }
}

impl std::fmt::Display for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Binary image payload stored with a record
#[derive(Debug, Clone)]
pub struct RecordImage {
    /// Raw image bytes
    pub data: Vec<u8>,
    /// MIME type of the bytes
    pub content_type: String,
}

/// Input for creating a new record
#[derive(Debug, Clone, Default)]
pub struct CreateRecordInput {
    /// Record title
    pub title: String,
    /// Markdown content
    pub content: String,
    /// Rendered HTML content (filled in by the service before persisting)
    pub content_html: Option<String>,
    /// Optional date or date range
    pub date: Option<String>,
    /// Which image strategy the input carries
    pub image_source: ImageSource,
    /// Remote image URL (URL mode)
    pub image_url: Option<String>,
    /// Uploaded image payload (upload mode)
    pub image: Option<RecordImage>,
}

/// Input for updating an existing record.
///
/// `None` fields are left untouched. Supplying a new image source replaces
/// the image branch wholesale (the inactive branch is cleared).
#[derive(Debug, Clone, Default)]
pub struct UpdateRecordInput {
    /// New title
    pub title: Option<String>,
    /// New markdown content
    pub content: Option<String>,
    /// Rendered HTML for the new content (filled in by the service)
    pub content_html: Option<String>,
    /// New date or date range
    pub date: Option<String>,
    /// New image strategy
    pub image_source: Option<ImageSource>,
    /// New remote image URL
    pub image_url: Option<String>,
    /// New uploaded image payload
    pub image: Option<RecordImage>,
}

impl UpdateRecordInput {
    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.content.is_some()
            || self.date.is_some()
            || self.image_source.is_some()
            || self.image_url.is_some()
            || self.image.is_some()
    }
}
