//! Validation schema for editable records
//!
//! One declarative schema drives both sides of the wire: the editor validates
//! fields as the user types (partial mode) and the whole draft at submit time
//! (full mode), and the record service runs the same schema before writing,
//! so a client that skips validation gets back the exact messages the form
//! would have shown.
//!
//! Messages are fixed strings; tests assert on them verbatim.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{ImageSource, RecordKind};

/// Minimum title length in characters
pub const TITLE_MIN_CHARS: usize = 6;

/// Minimum content length in characters
pub const CONTENT_MIN_CHARS: usize = 10;

/// Upload size ceiling (5 MiB)
pub const IMAGE_MAX_BYTES: usize = 5 * 1024 * 1024;

/// MIME types accepted for uploaded images
pub const ALLOWED_IMAGE_TYPES: &[&str] =
    &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Validation messages, stable across releases
pub mod messages {
    pub const TITLE_REQUIRED: &str = "Title is required";
    pub const TITLE_TOO_SHORT: &str = "Title must be at least 6 characters long";
    pub const CONTENT_REQUIRED: &str = "Content is required";
    pub const CONTENT_TOO_SHORT: &str = "Content must be at least 10 characters long";
    pub const DATE_REQUIRED: &str = "Date is required";
    pub const IMAGE_URL_INVALID: &str = "Please enter a valid image URL.";
    pub const IMAGE_LOAD_FAILED: &str = "The image could not be loaded. Check the URL.";
    pub const IMAGE_TYPE_INVALID: &str = "Unsupported image type. Use JPEG, PNG, GIF, or WebP.";
    pub const IMAGE_TOO_LARGE: &str = "Image must be 5 MB or smaller.";
    pub const IMAGE_MISSING: &str = "Please provide an image.";
}

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("valid URL regex"));

/// Whether a string is a plausible http(s) image URL.
///
/// Format only; whether the URL actually serves an image is the probe's job.
pub fn is_valid_image_url(url: &str) -> bool {
    URL_RE.is_match(url.trim())
}

/// A validatable field of the record form.
///
/// Image problems of every flavor (bad URL, failed probe, bad MIME type,
/// oversized file, missing source) are keyed under `Image`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Title,
    Content,
    Date,
    Image,
}

impl Field {
    /// Wire name of the field
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Content => "content",
            Field::Date => "date",
            Field::Image => "image",
        }
    }

    /// Parse a wire name
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "title" => Some(Field::Title),
            "content" => Some(Field::Content),
            "date" => Some(Field::Date),
            "image" => Some(Field::Image),
            // Server-side schemas key URL problems under the concrete field
            "imageUrl" => Some(Field::Image),
            _ => None,
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mapping from field to the first violated-rule message.
///
/// Only fields that failed the most recent pass have entries; a clean field
/// has no key at all. `BTreeMap` keeps serialization order stable.
pub type FieldErrors = BTreeMap<Field, String>;

/// Shape and size of a candidate image file, without the bytes
#[derive(Debug, Clone, Copy)]
pub struct ImageFileMeta<'a> {
    /// MIME type reported for the file
    pub content_type: &'a str,
    /// Size in bytes
    pub len: usize,
}

/// The field values under validation.
///
/// Borrowed view so both the editor state and the server's parsed multipart
/// form can be validated without copying.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordDraft<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub date: &'a str,
    pub image_source: ImageSource,
    pub image_url: &'a str,
    pub image_file: Option<ImageFileMeta<'a>>,
    /// Edit mode: the record already has a stored binary image, so an upload
    /// draft without a newly selected file is still submittable.
    pub has_stored_image: bool,
}

/// Declarative validation rules for one record kind
#[derive(Debug, Clone)]
pub struct RecordSchema {
    /// Minimum title length
    pub title_min_chars: usize,
    /// Minimum content length
    pub content_min_chars: usize,
    /// Whether the date field must be present
    pub date_required: bool,
    /// Upload size ceiling in bytes
    pub image_max_bytes: usize,
}

impl Default for RecordSchema {
    fn default() -> Self {
        Self {
            title_min_chars: TITLE_MIN_CHARS,
            content_min_chars: CONTENT_MIN_CHARS,
            date_required: false,
            image_max_bytes: IMAGE_MAX_BYTES,
        }
    }
}

impl RecordSchema {
    /// Schema for a record kind. Career entries carry a date range; the
    /// early-life story does not.
    pub fn for_kind(kind: RecordKind) -> Self {
        Self {
            date_required: !kind.is_singleton(),
            ..Self::default()
        }
    }

    /// Partial mode: validate a single field against the draft.
    ///
    /// Returns the first violated-rule message, or `None` when the field is
    /// valid. Requiredness of the image is a whole-record concern and is only
    /// enforced in full mode; here an empty image branch is simply clean.
    pub fn validate_field(&self, draft: &RecordDraft<'_>, field: Field) -> Option<String> {
        match field {
            Field::Title => {
                let title = draft.title.trim();
                if title.is_empty() {
                    Some(messages::TITLE_REQUIRED.to_string())
                } else if title.chars().count() < self.title_min_chars {
                    Some(messages::TITLE_TOO_SHORT.to_string())
                } else {
                    None
                }
            }
            Field::Content => {
                let content = draft.content.trim();
                if content.is_empty() {
                    Some(messages::CONTENT_REQUIRED.to_string())
                } else if content.chars().count() < self.content_min_chars {
                    Some(messages::CONTENT_TOO_SHORT.to_string())
                } else {
                    None
                }
            }
            Field::Date => {
                if self.date_required && draft.date.trim().is_empty() {
                    Some(messages::DATE_REQUIRED.to_string())
                } else {
                    None
                }
            }
            Field::Image => match draft.image_source {
                ImageSource::Url => {
                    let url = draft.image_url.trim();
                    if url.is_empty() {
                        None
                    } else if !URL_RE.is_match(url) {
                        Some(messages::IMAGE_URL_INVALID.to_string())
                    } else {
                        None
                    }
                }
                ImageSource::Upload => {
                    let file = draft.image_file?;
                    if !ALLOWED_IMAGE_TYPES.contains(&file.content_type) {
                        Some(messages::IMAGE_TYPE_INVALID.to_string())
                    } else if file.len > self.image_max_bytes {
                        Some(messages::IMAGE_TOO_LARGE.to_string())
                    } else {
                        None
                    }
                }
            },
        }
    }

    /// Full mode: validate the whole draft for submission.
    ///
    /// On top of the partial rules, the active image branch must actually
    /// carry a value (URL text, a selected file, or an already stored image).
    pub fn validate(&self, draft: &RecordDraft<'_>) -> FieldErrors {
        let mut errors = FieldErrors::new();

        for field in [Field::Title, Field::Content, Field::Date] {
            if let Some(message) = self.validate_field(draft, field) {
                errors.insert(field, message);
            }
        }

        if let Some(message) = self.validate_field(draft, Field::Image) {
            errors.insert(Field::Image, message);
        } else if !self.image_present(draft) {
            errors.insert(Field::Image, messages::IMAGE_MISSING.to_string());
        }

        errors
    }

    /// Whether the draft's active image branch carries a value
    fn image_present(&self, draft: &RecordDraft<'_>) -> bool {
        match draft.image_source {
            ImageSource::Url => !draft.image_url.trim().is_empty(),
            ImageSource::Upload => draft.image_file.is_some() || draft.has_stored_image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn valid_url_draft<'a>() -> RecordDraft<'a> {
        RecordDraft {
            title: "My Story",
            content: "Long enough text",
            date: "",
            image_source: ImageSource::Url,
            image_url: "https://example.com/a.jpg",
            image_file: None,
            has_stored_image: false,
        }
    }

    // ========================================================================
    // Full mode
    // ========================================================================

    #[test]
    fn test_valid_url_draft_has_no_errors() {
        let schema = RecordSchema::for_kind(RecordKind::EarlyLife);
        assert!(schema.validate(&valid_url_draft()).is_empty());
    }

    #[test]
    fn test_missing_title_is_reported_under_title() {
        let schema = RecordSchema::for_kind(RecordKind::EarlyLife);
        let draft = RecordDraft {
            title: "",
            ..valid_url_draft()
        };
        let errors = schema.validate(&draft);
        assert_eq!(
            errors.get(&Field::Title).map(String::as_str),
            Some(messages::TITLE_REQUIRED)
        );
    }

    #[test]
    fn test_short_title_message_is_exact() {
        let schema = RecordSchema::default();
        let draft = RecordDraft {
            title: "Hi",
            ..valid_url_draft()
        };
        let errors = schema.validate(&draft);
        assert_eq!(
            errors.get(&Field::Title).map(String::as_str),
            Some("Title must be at least 6 characters long")
        );
    }

    #[test]
    fn test_upload_mode_without_file_or_stored_image_is_missing() {
        let schema = RecordSchema::default();
        let draft = RecordDraft {
            image_source: ImageSource::Upload,
            image_url: "",
            ..valid_url_draft()
        };
        let errors = schema.validate(&draft);
        assert_eq!(
            errors.get(&Field::Image).map(String::as_str),
            Some("Please provide an image.")
        );
    }

    #[test]
    fn test_upload_mode_with_stored_image_is_valid() {
        let schema = RecordSchema::default();
        let draft = RecordDraft {
            image_source: ImageSource::Upload,
            image_url: "",
            has_stored_image: true,
            ..valid_url_draft()
        };
        assert!(schema.validate(&draft).is_empty());
    }

    #[test]
    fn test_url_mode_empty_url_is_missing_image() {
        let schema = RecordSchema::default();
        let draft = RecordDraft {
            image_url: "   ",
            ..valid_url_draft()
        };
        let errors = schema.validate(&draft);
        assert_eq!(
            errors.get(&Field::Image).map(String::as_str),
            Some(messages::IMAGE_MISSING)
        );
    }

    #[test]
    fn test_date_required_for_career_kinds_only() {
        let career = RecordSchema::for_kind(RecordKind::PlayerCareer);
        let story = RecordSchema::for_kind(RecordKind::EarlyLife);
        let draft = valid_url_draft();

        assert_eq!(
            career.validate(&draft).get(&Field::Date).map(String::as_str),
            Some(messages::DATE_REQUIRED)
        );
        assert!(story.validate(&draft).get(&Field::Date).is_none());
    }

    // ========================================================================
    // Partial mode
    // ========================================================================

    #[test]
    fn test_partial_title_only_looks_at_title() {
        let schema = RecordSchema::default();
        // Everything else invalid; the title check must not care
        let draft = RecordDraft {
            title: "Long enough title",
            content: "",
            ..RecordDraft::default()
        };
        assert!(schema.validate_field(&draft, Field::Title).is_none());
        assert_eq!(
            schema.validate_field(&draft, Field::Content).as_deref(),
            Some(messages::CONTENT_REQUIRED)
        );
    }

    #[test]
    fn test_partial_image_url_format() {
        let schema = RecordSchema::default();
        let bad = RecordDraft {
            image_url: "notaurl",
            ..valid_url_draft()
        };
        assert_eq!(
            schema.validate_field(&bad, Field::Image).as_deref(),
            Some(messages::IMAGE_URL_INVALID)
        );

        // Empty URL is clean in partial mode (requiredness is submit-time)
        let empty = RecordDraft {
            image_url: "",
            ..valid_url_draft()
        };
        assert!(schema.validate_field(&empty, Field::Image).is_none());
    }

    #[test]
    fn test_partial_upload_type_and_size() {
        let schema = RecordSchema::default();
        let bad_type = RecordDraft {
            image_source: ImageSource::Upload,
            image_file: Some(ImageFileMeta {
                content_type: "application/pdf",
                len: 100,
            }),
            ..RecordDraft::default()
        };
        assert_eq!(
            schema.validate_field(&bad_type, Field::Image).as_deref(),
            Some(messages::IMAGE_TYPE_INVALID)
        );

        let too_big = RecordDraft {
            image_source: ImageSource::Upload,
            image_file: Some(ImageFileMeta {
                content_type: "image/png",
                len: IMAGE_MAX_BYTES + 1,
            }),
            ..RecordDraft::default()
        };
        assert_eq!(
            schema.validate_field(&too_big, Field::Image).as_deref(),
            Some(messages::IMAGE_TOO_LARGE)
        );

        let fine = RecordDraft {
            image_source: ImageSource::Upload,
            image_file: Some(ImageFileMeta {
                content_type: "image/webp",
                len: 1024,
            }),
            ..RecordDraft::default()
        };
        assert!(schema.validate_field(&fine, Field::Image).is_none());
    }

    #[test]
    fn test_field_errors_serialize_with_wire_names() {
        let mut errors = FieldErrors::new();
        errors.insert(Field::Title, messages::TITLE_TOO_SHORT.to_string());
        errors.insert(Field::Image, messages::IMAGE_MISSING.to_string());
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["title"], messages::TITLE_TOO_SHORT);
        assert_eq!(json["image"], messages::IMAGE_MISSING);
    }

    // ========================================================================
    // Property: valid records validate clean
    // ========================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn property_valid_records_have_no_errors(
            title in "[a-zA-Z ]{6,40}",
            content in "[a-zA-Z ]{10,200}",
            date in "[0-9]{4}-[0-9]{4}",
            host in "[a-z]{3,12}",
            path in "[a-z0-9]{1,20}",
            use_url in proptest::bool::ANY,
            file_len in 1usize..IMAGE_MAX_BYTES,
        ) {
            // Trimmed lengths must still satisfy the minimums
            prop_assume!(title.trim().chars().count() >= TITLE_MIN_CHARS);
            prop_assume!(content.trim().chars().count() >= CONTENT_MIN_CHARS);

            let url = format!("https://{}.example.com/{}.jpg", host, path);
            let draft = RecordDraft {
                title: &title,
                content: &content,
                date: &date,
                image_source: if use_url { ImageSource::Url } else { ImageSource::Upload },
                image_url: if use_url { &url } else { "" },
                image_file: if use_url {
                    None
                } else {
                    Some(ImageFileMeta { content_type: "image/jpeg", len: file_len })
                },
                has_stored_image: false,
            };

            let schema = RecordSchema::for_kind(RecordKind::PlayerCareer);
            let errors = schema.validate(&draft);
            prop_assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        }
    }
}
